//! Protocol module: wire codes, framing, command decoding and responses.

pub mod command;
pub mod counter;
pub mod frame;
pub mod messages;
pub mod response;

pub use command::{Command, CommandError, KeyboardCommand, MouseCommand};
pub use counter::InstructionCounter;
pub use frame::{Decoded, Frame, FrameDecoder, ProtocolError};
pub use messages::*;
pub use response::{encode_info_message, encode_response, info_message_len};
