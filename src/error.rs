use miette::SourceSpan;
use std::ops::Range;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unsupported type: {what}")]
    UnsupportedType { what: String },
    #[error("Channel failure: {0}")]
    ChannelFailure(#[from] ChannelError),
    #[error("Malformed wire text: {0}")]
    Syntax(#[from] SyntaxError),
}

impl BridgeError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        BridgeError::UnsupportedType { what: what.into() }
    }
}

/// Failures reported by a [`crate::Channel`] implementation.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote error: {message}")]
    Remote { message: String },
}

impl ChannelError {
    pub fn remote(message: impl Into<String>) -> Self {
        ChannelError::Remote {
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Range<usize>,
    pub help: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn to_source_span(&self) -> SourceSpan {
        (self.span.start, self.span.len()).into()
    }
}
