//! Register, data object and GNSS operations for SIPF LPWA modules.
//!
//! This is the "just works" layer. Wrap any [`sipf_transport::Transport`]
//! in a [`SipfClient`] and call operations; each one sends a single command
//! and walks the module's reply to completion, an explicit rejection, or a
//! timeout.

pub mod auth;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod gnss;
pub mod object;
pub mod registers;
pub mod rx;
pub mod version;

pub use auth::{AuthMode, Credentials, MAX_CREDENTIAL_LEN};
pub use client::SipfClient;
pub use command::Command;
pub use config::{ClientConfig, PollBudget};
pub use error::{ClientError, DecodeError, ParseError, Result};
pub use gnss::GnssFix;
pub use object::{ObjectType, ObjectValue, Otid, SipfObject, OTID_LEN};
pub use rx::{decode_object_line, ObjectArena, ObjectSpan, RxBatch, DEFAULT_ARENA_CAPACITY};
pub use version::{FieldOrder, FirmwareVersion};
