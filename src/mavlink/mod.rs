pub mod commands;
pub mod crc;
mod frame;
mod parser;

pub use commands::{decode_command_int, decode_command_long, CommandInt, CommandLong};
pub use frame::{Frame, MavVersion};
pub use parser::MavParser;
