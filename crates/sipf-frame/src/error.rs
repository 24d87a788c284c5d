use sipf_transport::TransportError;

/// Errors that can occur while exchanging lines with the module.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No line terminator arrived before the inactivity timeout elapsed.
    #[error("timed out after {timeout_ms} ms without a complete line")]
    Timeout { timeout_ms: u64 },

    /// The line exceeded the reader's capacity before a terminator arrived.
    #[error("line too long (max {max} bytes)")]
    LineTooLong { max: usize },

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// True for an inactivity timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::Timeout { .. })
    }
}

/// Errors produced by the hex codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Hex text must contain two digits per byte.
    #[error("odd-length hex text ({len} digits)")]
    OddLength { len: usize },

    /// A character outside `0-9A-Fa-f`.
    #[error("invalid hex digit {ch:?} at index {index}")]
    InvalidDigit { ch: char, index: usize },

    /// The text does not hold the expected number of digits.
    #[error("expected {expected} hex digits, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
