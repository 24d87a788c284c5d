//! Reply line classification.
//!
//! Every line the module sends back is exactly one of:
//! - an echo of the command just written (starts with `$`)
//! - a terminal `OK` or `NG`
//! - data belonging to the reply

use crate::reader::Line;

/// Prefix of an echoed command line.
pub const ECHO_PREFIX: u8 = b'$';
/// Prefix of a success terminator.
pub const OK_PREFIX: &[u8] = b"OK";
/// Prefix of a rejection terminator.
pub const NG_PREFIX: &[u8] = b"NG";

/// Classified reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The module echoing the command back. Never data.
    Echo,
    /// Request accepted.
    Ok,
    /// Request rejected.
    Ng,
    /// Anything else.
    Data(Line),
}

impl Reply {
    /// Classify a received line.
    pub fn classify(line: Line) -> Self {
        if line.as_bytes().first() == Some(&ECHO_PREFIX) {
            Reply::Echo
        } else if line.starts_with(OK_PREFIX) {
            Reply::Ok
        } else if line.starts_with(NG_PREFIX) {
            Reply::Ng
        } else {
            Reply::Data(line)
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Echo => "echo",
            Reply::Ok => "ok",
            Reply::Ng => "ng",
            Reply::Data(_) => "data",
        }
    }
}
