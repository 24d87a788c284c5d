//! Single-byte register access.
//!
//! The register space is flat (`0x00..=0xFF`):
//!
//! | Address | Contents |
//! |---|---|
//! | `0x00` | auth mode |
//! | `0x10` | user name length |
//! | `0x20 + i` | user name byte `i` |
//! | `0x80` | password length |
//! | `0x90 + i` | password byte `i` |
//! | `0xF1..=0xF4` | firmware version bytes |

use sipf_frame::{hexcodec, Reply, Tier};
use sipf_transport::Transport;
use tracing::{trace, warn};

use crate::client::SipfClient;
use crate::command::Command;
use crate::error::{ClientError, DecodeError, Result};

/// Auth mode register.
pub const REG_AUTH_MODE: u8 = 0x00;
/// User name length register.
pub const REG_USER_NAME_LEN: u8 = 0x10;
/// First user name byte.
pub const REG_USER_NAME: u8 = 0x20;
/// Password length register.
pub const REG_PASSWORD_LEN: u8 = 0x80;
/// First password byte.
pub const REG_PASSWORD: u8 = 0x90;
/// Firmware version major byte.
pub const REG_FW_MAJOR: u8 = 0xF1;
/// Firmware version minor byte.
pub const REG_FW_MINOR: u8 = 0xF2;
/// Firmware version release byte, low half.
pub const REG_FW_RELEASE_LO: u8 = 0xF3;
/// Firmware version release byte, high half.
pub const REG_FW_RELEASE_HI: u8 = 0xF4;

impl<T: Transport> SipfClient<T> {
    /// Write one register byte (`$W`).
    ///
    /// Lines other than `OK`/`NG` are skipped until the inter-character
    /// timeout fires; the write itself is never repeated.
    pub fn write_register(&mut self, addr: u8, value: u8) -> Result<()> {
        let command = Command::WriteRegister { addr, value };
        self.send(&command)?;

        loop {
            match self.channel.next_reply(Tier::InterChar)? {
                Reply::Ok => return Ok(()),
                Reply::Ng => {
                    warn!(command = %command.label(), "register write rejected");
                    return Err(ClientError::rejected(command.label()));
                }
                other => trace!(?other, "ignoring line while awaiting write result"),
            }
        }
    }

    /// Read one register byte (`$R`).
    pub fn read_register(&mut self, addr: u8) -> Result<u8> {
        let command = Command::ReadRegister { addr };
        self.send(&command)?;

        let value = loop {
            match self.channel.next_reply(Tier::Command)? {
                Reply::Ng => {
                    warn!(command = %command.label(), "register read rejected");
                    return Err(ClientError::rejected(command.label()));
                }
                Reply::Data(line) if line.len() == 2 => {
                    break hexcodec::decode_byte(line.as_bytes()).map_err(DecodeError::from)?;
                }
                Reply::Ok => {
                    return Err(DecodeError::Unexpected {
                        state: "register value",
                        line: "OK".to_string(),
                    }
                    .into());
                }
                other => trace!(?other, "ignoring line while awaiting register value"),
            }
        };

        loop {
            match self.channel.next_reply(Tier::InterChar)? {
                Reply::Ok => return Ok(value),
                Reply::Ng => return Err(ClientError::rejected(command.label())),
                other => trace!(?other, "ignoring line while awaiting OK"),
            }
        }
    }
}
