//! Data objects and the `$$TX` send path.

use std::fmt;

use sipf_frame::{hexcodec, HexOrder, Reply, Tier};
use sipf_transport::Transport;
use tracing::{debug, trace, warn};

use crate::client::SipfClient;
use crate::command::Command;
use crate::error::{ClientError, DecodeError, Result};

/// Length of a transaction id.
pub const OTID_LEN: usize = 32;

/// Largest value a single object can carry.
pub const MAX_OBJECT_LEN: usize = 255;

/// Object type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float32,
    Float64,
    Bin,
    StrUtf8,
    /// A code this crate does not name. Transcribed like a numeric value.
    Unknown(u8),
}

impl ObjectType {
    pub fn code(self) -> u8 {
        match self {
            ObjectType::Uint8 => 0x00,
            ObjectType::Int8 => 0x01,
            ObjectType::Uint16 => 0x02,
            ObjectType::Int16 => 0x03,
            ObjectType::Uint32 => 0x04,
            ObjectType::Int32 => 0x05,
            ObjectType::Uint64 => 0x06,
            ObjectType::Int64 => 0x07,
            ObjectType::Float32 => 0x08,
            ObjectType::Float64 => 0x09,
            ObjectType::Bin => 0x10,
            ObjectType::StrUtf8 => 0x20,
            ObjectType::Unknown(code) => code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => ObjectType::Uint8,
            0x01 => ObjectType::Int8,
            0x02 => ObjectType::Uint16,
            0x03 => ObjectType::Int16,
            0x04 => ObjectType::Uint32,
            0x05 => ObjectType::Int32,
            0x06 => ObjectType::Uint64,
            0x07 => ObjectType::Int64,
            0x08 => ObjectType::Float32,
            0x09 => ObjectType::Float64,
            0x10 => ObjectType::Bin,
            0x20 => ObjectType::StrUtf8,
            other => ObjectType::Unknown(other),
        }
    }

    /// Hex transcription order for values of this type.
    ///
    /// Byte strings travel as-is; numeric values are little-endian in
    /// memory and most significant byte first on the wire.
    pub fn hex_order(self) -> HexOrder {
        match self {
            ObjectType::Bin | ObjectType::StrUtf8 => HexOrder::Forward,
            _ => HexOrder::Reversed,
        }
    }
}

/// Typed value to transmit.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bin(Vec<u8>),
    Str(String),
}

impl ObjectValue {
    pub fn obj_type(&self) -> ObjectType {
        match self {
            ObjectValue::U8(_) => ObjectType::Uint8,
            ObjectValue::I8(_) => ObjectType::Int8,
            ObjectValue::U16(_) => ObjectType::Uint16,
            ObjectValue::I16(_) => ObjectType::Int16,
            ObjectValue::U32(_) => ObjectType::Uint32,
            ObjectValue::I32(_) => ObjectType::Int32,
            ObjectValue::U64(_) => ObjectType::Uint64,
            ObjectValue::I64(_) => ObjectType::Int64,
            ObjectValue::F32(_) => ObjectType::Float32,
            ObjectValue::F64(_) => ObjectType::Float64,
            ObjectValue::Bin(_) => ObjectType::Bin,
            ObjectValue::Str(_) => ObjectType::StrUtf8,
        }
    }

    /// In-memory byte image: little-endian for numbers, raw for byte strings.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ObjectValue::U8(v) => v.to_le_bytes().to_vec(),
            ObjectValue::I8(v) => v.to_le_bytes().to_vec(),
            ObjectValue::U16(v) => v.to_le_bytes().to_vec(),
            ObjectValue::I16(v) => v.to_le_bytes().to_vec(),
            ObjectValue::U32(v) => v.to_le_bytes().to_vec(),
            ObjectValue::I32(v) => v.to_le_bytes().to_vec(),
            ObjectValue::U64(v) => v.to_le_bytes().to_vec(),
            ObjectValue::I64(v) => v.to_le_bytes().to_vec(),
            ObjectValue::F32(v) => v.to_le_bytes().to_vec(),
            ObjectValue::F64(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Bin(v) => v.clone(),
            ObjectValue::Str(v) => v.as_bytes().to_vec(),
        }
    }
}

/// Transaction id assigned by the module to a sent or received batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Otid(String);

impl Otid {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Otid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Otid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A received object. The value borrows from the decode arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipfObject<'a> {
    pub tag_id: u8,
    pub obj_type: ObjectType,
    pub value: &'a [u8],
}

impl<'a> SipfObject<'a> {
    /// Raw value bytes in memory order.
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Value as an unsigned integer, for values of 1 to 8 bytes.
    pub fn as_unsigned(&self) -> Option<u64> {
        if self.value.is_empty() || self.value.len() > 8 {
            return None;
        }
        let mut buf = [0u8; 8];
        buf[..self.value.len()].copy_from_slice(self.value);
        Some(u64::from_le_bytes(buf))
    }

    /// Value as a sign-extended integer, for values of 1 to 8 bytes.
    pub fn as_signed(&self) -> Option<i64> {
        let raw = self.as_unsigned()?;
        let shift = 64 - 8 * self.value.len() as u32;
        Some(((raw << shift) as i64) >> shift)
    }

    pub fn as_f32(&self) -> Option<f32> {
        let bytes: [u8; 4] = self.value.try_into().ok()?;
        Some(f32::from_le_bytes(bytes))
    }

    pub fn as_f64(&self) -> Option<f64> {
        let bytes: [u8; 8] = self.value.try_into().ok()?;
        Some(f64::from_le_bytes(bytes))
    }

    /// Value as text, when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value).ok()
    }

    /// Typed copy of the value, when the type and width agree.
    pub fn to_value(&self) -> Option<ObjectValue> {
        let value = match self.obj_type {
            ObjectType::Uint8 => ObjectValue::U8(u8::from_le_bytes(self.sized::<1>()?)),
            ObjectType::Int8 => ObjectValue::I8(i8::from_le_bytes(self.sized::<1>()?)),
            ObjectType::Uint16 => ObjectValue::U16(u16::from_le_bytes(self.sized::<2>()?)),
            ObjectType::Int16 => ObjectValue::I16(i16::from_le_bytes(self.sized::<2>()?)),
            ObjectType::Uint32 => ObjectValue::U32(u32::from_le_bytes(self.sized::<4>()?)),
            ObjectType::Int32 => ObjectValue::I32(i32::from_le_bytes(self.sized::<4>()?)),
            ObjectType::Uint64 => ObjectValue::U64(u64::from_le_bytes(self.sized::<8>()?)),
            ObjectType::Int64 => ObjectValue::I64(i64::from_le_bytes(self.sized::<8>()?)),
            ObjectType::Float32 => ObjectValue::F32(f32::from_le_bytes(self.sized::<4>()?)),
            ObjectType::Float64 => ObjectValue::F64(f64::from_le_bytes(self.sized::<8>()?)),
            ObjectType::Bin => ObjectValue::Bin(self.value.to_vec()),
            ObjectType::StrUtf8 => ObjectValue::Str(self.as_str()?.to_string()),
            ObjectType::Unknown(_) => return None,
        };
        Some(value)
    }

    fn sized<const N: usize>(&self) -> Option<[u8; N]> {
        self.value.try_into().ok()
    }
}

impl<T: Transport> SipfClient<T> {
    /// Submit one object (`$$TX`) and return the transaction id.
    ///
    /// `value` is the in-memory byte image; numeric types are transcribed
    /// last byte first.
    pub fn send_object(&mut self, tag_id: u8, obj_type: ObjectType, value: &[u8]) -> Result<Otid> {
        let max = self.config.max_object_len.min(MAX_OBJECT_LEN);
        if value.len() > max {
            return Err(ClientError::InvalidArgument(format!(
                "object value too long ({} bytes, max {max})",
                value.len()
            )));
        }

        let command = Command::Transmit {
            tag_id,
            obj_type,
            hex_value: hexcodec::encode(value, obj_type.hex_order()),
        };
        self.send(&command)?;

        let otid = loop {
            match self.channel.next_reply(Tier::Command)? {
                Reply::Ng => {
                    warn!(command = %command.label(), "object send rejected");
                    return Err(ClientError::rejected(command.label()));
                }
                Reply::Data(line) if line.len() == OTID_LEN => break Otid::new(line.text()),
                Reply::Ok => {
                    return Err(DecodeError::Unexpected {
                        state: "otid",
                        line: "OK".to_string(),
                    }
                    .into());
                }
                other => trace!(?other, "ignoring line while awaiting otid"),
            }
        };

        loop {
            match self.channel.next_reply(Tier::InterChar)? {
                Reply::Ok => {
                    debug!(%otid, tag_id, len = value.len(), "object sent");
                    return Ok(otid);
                }
                Reply::Ng => return Err(ClientError::rejected(command.label())),
                other => trace!(?other, "ignoring line while awaiting OK"),
            }
        }
    }

    /// Submit a typed value.
    pub fn send_value(&mut self, tag_id: u8, value: &ObjectValue) -> Result<Otid> {
        self.send_object(tag_id, value.obj_type(), &value.to_bytes())
    }
}
