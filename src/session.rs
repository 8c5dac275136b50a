use crate::builder::ExpressionBuilder;
use crate::config::BridgeConfig;
use crate::error::{BridgeResult, ChannelError};
use crate::value::Value;
use crate::wire::{printer::to_wire, reader::Reader};
use log::{debug, trace};
use std::fmt;
use std::rc::Rc;

/// Transport to the remote process. Implementors own spawning, framing and
/// any locking; this crate only hands over finished expressions.
pub trait Channel {
    /// Sends one expression and returns the raw wire text of the reply.
    fn send(&self, expression: &str) -> Result<String, ChannelError>;
}

/// A channel together with the settings every handle created through it
/// shares. Cloning is cheap and keeps pointing at the same channel.
#[derive(Clone)]
pub struct Session {
    channel: Rc<dyn Channel>,
    config: Rc<BridgeConfig>,
}

impl Session {
    pub fn new(channel: Rc<dyn Channel>) -> Self {
        Self::with_config(channel, BridgeConfig::default())
    }

    pub fn with_config(channel: Rc<dyn Channel>, config: BridgeConfig) -> Self {
        Self {
            channel,
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn builder(&self) -> ExpressionBuilder {
        ExpressionBuilder::from_config(&self.config)
    }

    /// Encodes `expression`, sends it and decodes the reply. Handles in the
    /// reply are bound to this session.
    pub fn evaluate(&self, expression: &Value) -> BridgeResult<Value> {
        let text = to_wire(expression)?;
        debug!("evaluating {text}");
        let response = self.channel.send(&text)?;
        trace!("response {response}");
        self.read(&response)
    }

    /// Decodes a literal reply without sending anything.
    pub fn read(&self, text: &str) -> BridgeResult<Value> {
        Reader::bound_to(self).read(text)
    }

    /// Asks the remote side to free handle `id`.
    pub fn release(&self, id: u64) -> Result<(), ChannelError> {
        debug!("releasing handle #{id}");
        self.channel.send(&format!("#{id}!")).map(|_| ())
    }

    pub fn same_channel(&self, other: &Session) -> bool {
        Rc::ptr_eq(&self.channel, &other.channel)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
