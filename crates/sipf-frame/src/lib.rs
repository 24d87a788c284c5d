//! Line framing and reply classification for the SIPF module protocol.
//!
//! The module speaks a line-oriented ASCII protocol over a serial byte
//! stream:
//! - Commands are written as one line terminated with CRLF
//! - Replies are lines terminated with CR or LF
//! - The module echoes each command back as a line starting with `$`
//! - A reply ends with `OK` or `NG`; anything else is data
//!
//! Binary payloads travel as two hex digits per byte. See [`hexcodec`].

pub mod channel;
pub mod codec;
pub mod error;
pub mod hexcodec;
pub mod reader;
pub mod reply;

pub use channel::CommandChannel;
pub use codec::{
    encode_command, FrameConfig, Tier, DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_INTER_CHAR_TIMEOUT_MS,
    DEFAULT_MAX_LINE_LEN,
};
pub use error::{FrameError, HexError, Result};
pub use hexcodec::HexOrder;
pub use reader::{Line, LineReader};
pub use reply::Reply;
