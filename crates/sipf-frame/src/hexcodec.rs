//! Two-hex-digit-per-byte transcription used by register values, object
//! payloads and timestamps.
//!
//! Numeric object values are held little-endian in memory but travel most
//! significant byte first, so every operation takes a [`HexOrder`].

use crate::error::HexError;

/// Order in which bytes are transcribed to hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexOrder {
    /// First byte first.
    Forward,
    /// Last byte first.
    Reversed,
}

/// Encode bytes as uppercase hex, two digits per byte.
pub fn encode(bytes: &[u8], order: HexOrder) -> String {
    match order {
        HexOrder::Forward => hex::encode_upper(bytes),
        HexOrder::Reversed => {
            let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
            hex::encode_upper(reversed)
        }
    }
}

/// Decode exactly two hex digits into one byte.
pub fn decode_byte(pair: &[u8]) -> Result<u8, HexError> {
    let mut out = [0u8; 1];
    decode_into(pair, HexOrder::Forward, &mut out)?;
    Ok(out[0])
}

/// Decode hex text into `out`, which must hold exactly `text.len() / 2` bytes.
pub fn decode_into(text: &[u8], order: HexOrder, out: &mut [u8]) -> Result<(), HexError> {
    if text.len() % 2 != 0 {
        return Err(HexError::OddLength { len: text.len() });
    }
    if text.len() != out.len() * 2 {
        return Err(HexError::LengthMismatch {
            expected: out.len() * 2,
            actual: text.len(),
        });
    }

    hex::decode_to_slice(text, out).map_err(|err| from_hex_error(err, text.len()))?;

    if order == HexOrder::Reversed {
        out.reverse();
    }
    Ok(())
}

/// Decode hex text of any even length into a new buffer.
pub fn decode(text: &[u8], order: HexOrder) -> Result<Vec<u8>, HexError> {
    if text.len() % 2 != 0 {
        return Err(HexError::OddLength { len: text.len() });
    }
    let mut out = vec![0u8; text.len() / 2];
    decode_into(text, order, &mut out)?;
    Ok(out)
}

fn from_hex_error(err: hex::FromHexError, len: usize) -> HexError {
    match err {
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            HexError::InvalidDigit { ch: c, index }
        }
        hex::FromHexError::OddLength => HexError::OddLength { len },
        hex::FromHexError::InvalidStringLength => HexError::LengthMismatch {
            expected: len,
            actual: len,
        },
    }
}
