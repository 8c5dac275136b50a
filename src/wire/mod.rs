pub mod printer;
pub mod reader;

pub use printer::to_wire;
pub use reader::{from_wire, parse_wire, Datum, Reader};
