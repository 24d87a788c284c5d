use std::fmt;

use sipf_transport::Transport;
use tracing::info;

use crate::client::SipfClient;
use crate::error::Result;
use crate::registers::{REG_FW_MAJOR, REG_FW_MINOR, REG_FW_RELEASE_HI, REG_FW_RELEASE_LO};

/// First firmware layout that sends `tag_id` before `type` in object lines.
const CURRENT_ORDER_SINCE: u32 = 0x0003_0001;

/// Packed module firmware version.
///
/// Bits 31..24 hold the major byte (register `0xF1`), bits 23..16 the minor
/// byte (`0xF2`), bits 15..8 register `0xF4` and bits 7..0 register `0xF3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion(u32);

impl FirmwareVersion {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Assemble from the four version registers, given in read order.
    pub fn from_registers(major: u8, minor: u8, release_lo: u8, release_hi: u8) -> Self {
        Self(
            u32::from(major) << 24
                | u32::from(minor) << 16
                | u32::from(release_hi) << 8
                | u32::from(release_lo),
        )
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn minor(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn release(self) -> u16 {
        self.0 as u16
    }

    /// Object line field order used by this firmware.
    pub fn field_order(self) -> FieldOrder {
        FieldOrder::for_version(self)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major(), self.minor(), self.release())
    }
}

/// Order of the two leading single-byte fields in a received object line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// `<type> <tag_id>`, packed versions below `0x0003_0001`.
    Legacy,
    /// `<tag_id> <type>`.
    Current,
}

impl FieldOrder {
    pub fn for_version(version: FirmwareVersion) -> Self {
        if version.raw() < CURRENT_ORDER_SINCE {
            FieldOrder::Legacy
        } else {
            FieldOrder::Current
        }
    }

    /// Map the two wire fields to `(tag_id, type_code)`.
    pub fn assign(self, first: u8, second: u8) -> (u8, u8) {
        match self {
            FieldOrder::Legacy => (second, first),
            FieldOrder::Current => (first, second),
        }
    }
}

impl<T: Transport> SipfClient<T> {
    /// Read the firmware version and cache it.
    ///
    /// Registers `0xF1..=0xF4` are read in order; any failed read fails the
    /// call and leaves the cache untouched.
    pub fn get_firmware_version(&mut self) -> Result<FirmwareVersion> {
        let major = self.read_register(REG_FW_MAJOR)?;
        let minor = self.read_register(REG_FW_MINOR)?;
        let release_lo = self.read_register(REG_FW_RELEASE_LO)?;
        let release_hi = self.read_register(REG_FW_RELEASE_HI)?;

        let version = FirmwareVersion::from_registers(major, minor, release_lo, release_hi);
        info!(%version, raw = version.raw(), "firmware version cached");
        self.version = Some(version);
        Ok(version)
    }

    /// Field order for decoding object lines, reading the version if not cached.
    pub(crate) fn field_order(&mut self) -> Result<FieldOrder> {
        let version = match self.version {
            Some(version) => version,
            None => self.get_firmware_version()?,
        };
        Ok(version.field_order())
    }
}

#[cfg(test)]
mod tests {
    use sipf_transport::ScriptedTransport;

    use super::*;

    #[test]
    fn register_layout_swaps_release_bytes() {
        let v = FirmwareVersion::from_registers(0x03, 0x00, 0x05, 0x01);
        assert_eq!(v.raw(), 0x0300_0105);
        assert_eq!(v.major(), 3);
        assert_eq!(v.minor(), 0);
        assert_eq!(v.release(), 0x0105);
        assert_eq!(v.to_string(), "v3.0.261");
    }

    #[test]
    fn field_order_threshold() {
        assert_eq!(
            FirmwareVersion::from_raw(0x0003_0000).field_order(),
            FieldOrder::Legacy
        );
        assert_eq!(
            FirmwareVersion::from_raw(0x0003_0001).field_order(),
            FieldOrder::Current
        );
        assert_eq!(
            FirmwareVersion::from_raw(0x0002_0009).field_order(),
            FieldOrder::Legacy
        );
        assert_eq!(
            FirmwareVersion::from_raw(0x0003_0005).field_order(),
            FieldOrder::Current
        );
    }

    #[test]
    fn assign_swaps_for_legacy() {
        assert_eq!(FieldOrder::Current.assign(0x01, 0x20), (0x01, 0x20));
        assert_eq!(FieldOrder::Legacy.assign(0x01, 0x20), (0x20, 0x01));
    }

    #[test]
    fn get_firmware_version_reads_in_order_and_caches() {
        let mut t = ScriptedTransport::new();
        t.reply_lines(&["$R F1", "01", "OK"]);
        t.reply_lines(&["$R F2", "02", "OK"]);
        t.reply_lines(&["$R F3", "03", "OK"]);
        t.reply_lines(&["$R F4", "04", "OK"]);
        let mut client = SipfClient::new(t);

        let v = client.get_firmware_version().unwrap();
        assert_eq!(v.raw(), 0x0102_0403);
        assert_eq!(client.cached_version(), Some(v));
        assert_eq!(
            client.transport().written_lines(),
            vec!["$R F1", "$R F2", "$R F3", "$R F4"]
        );
    }

    #[test]
    fn get_firmware_version_failure_keeps_cache_empty() {
        let mut t = ScriptedTransport::new();
        t.reply_lines(&["01", "OK"]);
        t.reply_lines(&["NG"]);
        let mut client = SipfClient::new(t);

        assert!(client.get_firmware_version().unwrap_err().is_rejected());
        assert!(client.cached_version().is_none());
        assert_eq!(client.transport().written_lines().len(), 2);
    }

    #[test]
    fn field_order_uses_cache() {
        let mut client = SipfClient::new(ScriptedTransport::new());
        client.version = Some(FirmwareVersion::from_raw(0x0002_0009));
        assert_eq!(client.field_order().unwrap(), FieldOrder::Legacy);
        assert!(client.transport().written().is_empty());
    }
}
