/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read was attempted with no byte available.
    #[error("no byte available to read")]
    Empty,

    /// The serial device could not be opened or configured.
    #[error("serial port error on {port}: {message}")]
    Serial { port: String, message: String },
}

pub type Result<T> = std::result::Result<T, TransportError>;
