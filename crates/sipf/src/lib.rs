//! Host-side driver for SIPF LPWA serial modules.
//!
//! A SIPF module is driven over a UART with a line-oriented ASCII protocol:
//! single-byte register access, data object upload and download, and GNSS
//! queries.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream capability (serial port behind `serial`, scripted mock behind `mock`)
//! - [`frame`]: line reader, reply classification, hex codec and the command channel
//! - [`client`]: module operations built on the channel
//! - [`logging`]: `tracing` subscriber setup (behind the `logging` feature)
//!
//! ```no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sipf::client::{ObjectValue, SipfClient};
//! use sipf::transport::SerialTransport;
//!
//! let mut client = SipfClient::new(SerialTransport::open("/dev/ttyUSB0")?);
//! println!("firmware {}", client.get_firmware_version()?);
//! let otid = client.send_value(0x01, &ObjectValue::U32(42))?;
//! println!("sent {otid}");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

/// Re-export transport types.
pub mod transport {
    pub use sipf_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sipf_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use sipf_client::*;
}

#[cfg(feature = "logging")]
pub mod logging;
