pub mod builder;
pub mod config;
pub mod cons;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod session;
pub mod value;
pub mod wire;

pub use builder::ExpressionBuilder;
pub use config::BridgeConfig;
pub use cons::{build_dotted, build_list, build_quoted, Cons, ListIter};
pub use error::{BridgeError, BridgeResult, ChannelError, SyntaxError};
pub use handle::RemoteHandle;
pub use session::{Channel, Session};
pub use value::{HashTable, Value};
pub use wire::{from_wire, to_wire};

#[cfg(test)]
mod tests;
