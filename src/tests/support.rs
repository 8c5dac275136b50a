use crate::error::ChannelError;
use crate::session::Channel;
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Mode {
    #[default]
    Replying,
    Failing,
    Panicking,
}

/// In-memory channel that records every expression and answers from a
/// queue, falling back to `NIL` once the queue is empty.
#[derive(Default)]
pub(crate) struct RecordingChannel {
    sent: RefCell<Vec<String>>,
    replies: RefCell<VecDeque<Result<String, ChannelError>>>,
    mode: Mode,
}

impl RecordingChannel {
    pub(crate) fn replying<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        let channel = Self::default();
        for reply in replies {
            channel.push_reply(Ok(reply.to_string()));
        }
        channel
    }

    pub(crate) fn failing() -> Self {
        Self {
            mode: Mode::Failing,
            ..Self::default()
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            mode: Mode::Panicking,
            ..Self::default()
        }
    }

    pub(crate) fn push_reply(&self, reply: Result<String, ChannelError>) {
        self.replies.borrow_mut().push_back(reply);
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl Channel for RecordingChannel {
    fn send(&self, expression: &str) -> Result<String, ChannelError> {
        self.sent.borrow_mut().push(expression.to_string());
        match self.mode {
            Mode::Replying => self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok("NIL".to_string())),
            Mode::Failing => Err(ChannelError::Closed),
            Mode::Panicking => panic!("transport crashed while sending {expression}"),
        }
    }
}
