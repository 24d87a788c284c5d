use std::borrow::Cow;
use std::fmt;

use bytes::{Bytes, BytesMut};
use sipf_transport::Transport;

use crate::codec::DEFAULT_MAX_LINE_LEN;
use crate::error::{FrameError, Result};

/// One received line with its terminator stripped.
#[derive(Clone, PartialEq, Eq)]
pub struct Line(Bytes);

impl Line {
    /// Wrap raw line bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Raw line bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length line.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for a line with nothing but whitespace, such as the empty line
    /// left behind by the LF half of a CRLF pair.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(u8::is_ascii_whitespace)
    }

    /// Check for a literal prefix.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Line text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl AsRef<[u8]> for Line {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?})", self.text())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Reads CR- or LF-terminated lines from a [`Transport`].
///
/// The timeout measures inactivity: it restarts every time a poll observes
/// received bytes, so a slow but steady sender never times out. State lives
/// only for the duration of one [`read_line`](LineReader::read_line) call.
#[derive(Debug, Clone)]
pub struct LineReader {
    max_line_len: usize,
}

impl LineReader {
    /// Create a reader with the default line capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a reader that accepts lines of at most `max_line_len` bytes.
    pub fn with_capacity(max_line_len: usize) -> Self {
        Self { max_line_len }
    }

    /// Line capacity in bytes, terminator excluded.
    pub fn capacity(&self) -> usize {
        self.max_line_len
    }

    /// Read one line (blocking).
    ///
    /// Bytes after the terminator stay in the transport. Returns
    /// `FrameError::Timeout` once `timeout_ms` passes with no byte received
    /// and `FrameError::LineTooLong` as soon as the line outgrows the
    /// capacity; in both cases unread bytes are left in place.
    pub fn read_line<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        timeout_ms: u64,
    ) -> Result<Line> {
        let mut buf = BytesMut::with_capacity(self.max_line_len.min(DEFAULT_MAX_LINE_LEN));
        let mut last_activity = transport.now_millis();

        loop {
            let now = transport.now_millis();
            let available = transport.bytes_available()?;

            if available > 0 {
                last_activity = now;
                for _ in 0..available {
                    let byte = transport.read_byte()?;
                    if byte == b'\r' || byte == b'\n' {
                        return Ok(Line(buf.freeze()));
                    }
                    if buf.len() >= self.max_line_len {
                        return Err(FrameError::LineTooLong {
                            max: self.max_line_len,
                        });
                    }
                    buf.extend_from_slice(&[byte]);
                }
            }

            if now.saturating_sub(last_activity) > timeout_ms {
                return Err(FrameError::Timeout { timeout_ms });
            }
        }
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use sipf_transport::{ScriptedTransport, Step};

    use super::*;

    #[test]
    fn read_single_line() {
        let mut t = ScriptedTransport::new();
        t.preload(b"OK\r\n");

        let line = LineReader::new().read_line(&mut t, 500).unwrap();
        assert_eq!(line.as_bytes(), b"OK");
    }

    #[test]
    fn crlf_leaves_blank_line_behind() {
        let mut t = ScriptedTransport::new();
        t.preload(b"A5\r\nOK\r\n");
        let reader = LineReader::new();

        assert_eq!(reader.read_line(&mut t, 500).unwrap().as_bytes(), b"A5");
        let blank = reader.read_line(&mut t, 500).unwrap();
        assert!(blank.is_empty());
        assert!(blank.is_blank());
        assert_eq!(reader.read_line(&mut t, 500).unwrap().as_bytes(), b"OK");
    }

    #[test]
    fn lf_alone_terminates() {
        let mut t = ScriptedTransport::new();
        t.preload(b"V,0,0,0,0,0,x\n");
        let line = LineReader::new().read_line(&mut t, 500).unwrap();
        assert_eq!(line.text(), "V,0,0,0,0,0,x");
    }

    #[test]
    fn line_assembled_across_chunks() {
        let mut t = ScriptedTransport::new();
        t.stream(vec![
            Step::raw("0123"),
            Step::Silence(100),
            Step::raw("4567"),
            Step::Silence(100),
            Step::raw("\r"),
        ]);

        let line = LineReader::new().read_line(&mut t, 500).unwrap();
        assert_eq!(line.as_bytes(), b"01234567");
    }

    #[test]
    fn activity_resets_the_timeout() {
        let mut t = ScriptedTransport::new();
        t.stream(vec![
            Step::raw("A"),
            Step::Silence(400),
            Step::raw("B"),
            Step::Silence(400),
            Step::raw("C\n"),
        ]);

        // Total span exceeds the timeout; no single gap does.
        let line = LineReader::new().read_line(&mut t, 500).unwrap();
        assert_eq!(line.as_bytes(), b"ABC");
    }

    #[test]
    fn silence_times_out_without_losing_data() {
        let mut t = ScriptedTransport::new();
        t.stream(vec![Step::Silence(600), Step::line("OK")]);

        let err = LineReader::new().read_line(&mut t, 500).unwrap_err();
        assert!(matches!(err, FrameError::Timeout { timeout_ms: 500 }));
        assert_eq!(t.unread(), b"OK\r\n".to_vec());
    }

    #[test]
    fn partial_line_then_silence_times_out() {
        let mut t = ScriptedTransport::new();
        t.stream(vec![Step::raw("0A 1"), Step::Silence(1_000)]);

        let err = LineReader::new().read_line(&mut t, 500).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn overlong_line_is_an_explicit_error() {
        let mut t = ScriptedTransport::new();
        t.preload(b"0123456789\r\nOK\r\n");

        let err = LineReader::with_capacity(8).read_line(&mut t, 500).unwrap_err();
        assert!(matches!(err, FrameError::LineTooLong { max: 8 }));
        assert_eq!(t.unread(), b"9\r\nOK\r\n".to_vec());
    }

    #[test]
    fn line_at_exact_capacity_is_accepted() {
        let mut t = ScriptedTransport::new();
        t.preload(b"01234567\r\n");

        let line = LineReader::with_capacity(8).read_line(&mut t, 500).unwrap();
        assert_eq!(line.len(), 8);
    }

    #[test]
    fn debug_and_display_show_text() {
        let line = Line::new(&b"NG"[..]);
        assert_eq!(format!("{line}"), "NG");
        assert_eq!(format!("{line:?}"), "Line(\"NG\")");
    }
}
