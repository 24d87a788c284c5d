use sipf_frame::{FrameError, HexError};

/// Errors that can occur in module operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Line-level error: timeout, overlong line or transport failure.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The module answered `NG`.
    #[error("module rejected {command}")]
    Rejected { command: String },

    /// A reply did not match the expected layout.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A GNSS record could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A convergence poll ran out of budget.
    #[error("deadline exceeded after {attempts} attempts ({elapsed_ms} ms)")]
    DeadlineExceeded { attempts: u32, elapsed_ms: u64 },

    /// An argument was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ClientError {
    /// True when no reply arrived within the active timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Frame(err) if err.is_timeout())
    }

    /// True when the module answered `NG`.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }

    pub(crate) fn rejected(command: impl Into<String>) -> Self {
        ClientError::Rejected {
            command: command.into(),
        }
    }
}

/// Malformed reply content. Always fatal to the current call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Invalid hex digits or width.
    #[error("invalid hex: {0}")]
    Hex(#[from] HexError),

    /// A fixed-width field had the wrong length.
    #[error("{field}: expected {expected} characters, got {actual}")]
    FieldWidth {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An object line is missing a space separator.
    #[error("object line: expected separator at position {position}")]
    Separator { position: usize },

    /// An object line is shorter than the minimum layout.
    #[error("object line too short ({len} characters)")]
    ShortLine { len: usize },

    /// The decode arena cannot hold another value.
    #[error("decode arena overflow: need {needed} bytes, capacity {capacity}")]
    ArenaOverflow { needed: usize, capacity: usize },

    /// A line arrived that the current reply state does not accept.
    #[error("unexpected line while reading {state}: {line:?}")]
    Unexpected { state: &'static str, line: String },
}

/// A GNSS location record did not match its layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

pub type Result<T> = std::result::Result<T, ClientError>;
