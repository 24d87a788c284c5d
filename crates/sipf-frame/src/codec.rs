use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Default wait for the first line of a reply: the module may be busy
/// talking to the network.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

/// Default inactivity limit once a multi-line reply is underway.
pub const DEFAULT_INTER_CHAR_TIMEOUT_MS: u64 = 500;

/// Default line capacity: the longest object line, `TT YY LL` plus a
/// separator and 255 value bytes as hex, is 519 characters.
pub const DEFAULT_MAX_LINE_LEN: usize = 520;

/// Command line terminator.
pub const LINE_END: &[u8] = b"\r\n";

/// Timeout tier used while waiting for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// First line of a reply to a freshly sent command.
    Command,
    /// A line inside a reply that has already started.
    InterChar,
}

/// Encode a command line for transmission.
///
/// Wire format:
/// ```text
/// ┌────────────────────────┬──────────┐
/// │ Command text (ASCII)   │ CR LF    │
/// └────────────────────────┴──────────┘
/// ```
pub fn encode_command(command: &str, dst: &mut BytesMut) {
    dst.reserve(command.len() + LINE_END.len());
    dst.put_slice(command.as_bytes());
    dst.put_slice(LINE_END);
}

/// Configuration for line framing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Inactivity timeout for the first line of a reply.
    pub command_timeout_ms: u64,
    /// Inactivity timeout for subsequent lines of a reply.
    pub inter_char_timeout_ms: u64,
    /// Maximum line length in bytes, terminator excluded.
    pub max_line_len: usize,
}

impl FrameConfig {
    /// Resolve a timeout tier to milliseconds.
    pub fn timeout_ms(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Command => self.command_timeout_ms,
            Tier::InterChar => self.inter_char_timeout_ms,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            inter_char_timeout_ms: DEFAULT_INTER_CHAR_TIMEOUT_MS,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_crlf() {
        let mut buf = BytesMut::new();
        encode_command("$R F1", &mut buf);
        assert_eq!(buf.as_ref(), b"$R F1\r\n");
    }

    #[test]
    fn encode_empty_command() {
        let mut buf = BytesMut::new();
        encode_command("", &mut buf);
        assert_eq!(buf.as_ref(), b"\r\n");
    }

    #[test]
    fn tiers_resolve_to_configured_timeouts() {
        let cfg = FrameConfig {
            command_timeout_ms: 3_000,
            inter_char_timeout_ms: 50,
            ..FrameConfig::default()
        };
        assert_eq!(cfg.timeout_ms(Tier::Command), 3_000);
        assert_eq!(cfg.timeout_ms(Tier::InterChar), 50);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: FrameConfig = serde_json::from_str(r#"{"inter_char_timeout_ms": 250}"#).unwrap();
        assert_eq!(cfg.inter_char_timeout_ms, 250);
        assert_eq!(cfg.command_timeout_ms, DEFAULT_COMMAND_TIMEOUT_MS);
        assert_eq!(cfg.max_line_len, DEFAULT_MAX_LINE_LEN);
    }

    #[test]
    fn default_capacity_fits_largest_object_line() {
        assert!(FrameConfig::default().max_line_len >= 9 + 2 * 255);
    }
}
