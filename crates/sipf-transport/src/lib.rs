//! Byte-stream transport abstraction for SIPF serial modules.
//!
//! The protocol engine never touches a device directly. It consumes the
//! [`Transport`] capability: poll for available bytes, read one byte,
//! write a buffer, and read a monotonic millisecond clock.
//!
//! This is the lowest layer of the workspace. Everything else builds on top
//! of the trait provided here.

pub mod error;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{Result, TransportError};
pub use traits::Transport;

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport};

#[cfg(any(test, feature = "mock"))]
pub use mock::{ScriptedTransport, Step};
