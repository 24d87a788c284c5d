//! Commands understood by the module.
//!
//! - `$W <addr> <value>`: write one register byte
//! - `$R <addr>`: read one register byte
//! - `$$TX <tag> <type> <hex>`: submit a data object
//! - `$$RX`: fetch queued inbound data objects
//! - `$$GNSSEN <0|1>`: switch the GNSS receiver
//! - `$$GNSSLOC`: read the last GNSS fix

use std::fmt;

use crate::object::ObjectType;

/// One outbound command line. Built per call, carries no state.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a register byte.
    WriteRegister { addr: u8, value: u8 },
    /// Read a register byte.
    ReadRegister { addr: u8 },
    /// Submit a data object whose value is already hex-encoded.
    Transmit {
        tag_id: u8,
        obj_type: ObjectType,
        hex_value: String,
    },
    /// Fetch queued inbound objects.
    Receive,
    /// Enable or disable GNSS.
    GnssEnable(bool),
    /// Read the GNSS fix.
    GnssLocation,
}

impl Command {
    /// Encode the command text, without terminator.
    pub fn encode(&self) -> String {
        match self {
            Command::WriteRegister { addr, value } => format!("$W {addr:02X} {value:02X}"),
            Command::ReadRegister { addr } => format!("$R {addr:02X}"),
            Command::Transmit {
                tag_id,
                obj_type,
                hex_value,
            } => format!("$$TX {tag_id:02X} {:02X} {hex_value}", obj_type.code()),
            Command::Receive => "$$RX".to_string(),
            Command::GnssEnable(enabled) => format!("$$GNSSEN {}", u8::from(*enabled)),
            Command::GnssLocation => "$$GNSSLOC".to_string(),
        }
    }

    /// Short description safe for logs and errors.
    ///
    /// Register values and object payloads are left out; they may carry
    /// credentials or user data.
    pub fn label(&self) -> String {
        match self {
            Command::WriteRegister { addr, .. } => format!("$W {addr:02X}"),
            Command::ReadRegister { addr } => format!("$R {addr:02X}"),
            Command::Transmit { tag_id, .. } => format!("$$TX {tag_id:02X}"),
            Command::Receive => "$$RX".to_string(),
            Command::GnssEnable(_) => "$$GNSSEN".to_string(),
            Command::GnssLocation => "$$GNSSLOC".to_string(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.label())
    }
}
