//! Deterministic in-memory transport for tests.
//!
//! Replies are scripted per command: every call to `write_bytes` releases
//! the next queued reply. Time is virtual; each poll that finds nothing to
//! read advances the clock by one millisecond, so timeout paths run
//! instantly and reproducibly.

use std::collections::VecDeque;

use bytes::BytesMut;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// One element of a scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Bytes that become readable at once.
    Bytes(Vec<u8>),
    /// Milliseconds of silence before the next step is released.
    Silence(u64),
}

impl Step {
    /// A reply line terminated with CRLF, as the module sends it.
    pub fn line(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 2);
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(b"\r\n");
        Step::Bytes(bytes)
    }

    /// Raw bytes with no terminator added.
    pub fn raw(bytes: impl AsRef<[u8]>) -> Self {
        Step::Bytes(bytes.as_ref().to_vec())
    }
}

/// Scripted transport with a virtual millisecond clock.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    rx: VecDeque<u8>,
    pending: VecDeque<Step>,
    replies: VecDeque<Vec<Step>>,
    written: BytesMut,
    clock: u64,
}

impl ScriptedTransport {
    /// Create a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply released by the next unanswered write.
    pub fn reply(&mut self, steps: Vec<Step>) -> &mut Self {
        self.replies.push_back(steps);
        self
    }

    /// Queue a reply made of plain CRLF-terminated lines.
    pub fn reply_lines(&mut self, lines: &[&str]) -> &mut Self {
        self.reply(lines.iter().map(|line| Step::line(line)).collect())
    }

    /// Make bytes readable immediately, before any write.
    pub fn preload(&mut self, bytes: &[u8]) -> &mut Self {
        self.rx.extend(bytes.iter().copied());
        self
    }

    /// Queue steps that play out without waiting for a write.
    pub fn stream(&mut self, steps: Vec<Step>) -> &mut Self {
        self.pending.extend(steps);
        self
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Written bytes split into CRLF-terminated command lines.
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Bytes not yet consumed, including scripted steps not yet released.
    pub fn unread(&self) -> Vec<u8> {
        let mut out: Vec<u8> = self.rx.iter().copied().collect();
        for step in &self.pending {
            if let Step::Bytes(bytes) = step {
                out.extend_from_slice(bytes);
            }
        }
        out
    }

    /// Number of scripted replies not yet released by a write.
    pub fn queued_replies(&self) -> usize {
        self.replies.len()
    }

    /// Advance the virtual clock.
    pub fn advance(&mut self, ms: u64) {
        self.clock += ms;
    }
}

impl Transport for ScriptedTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        loop {
            if !self.rx.is_empty() {
                return Ok(self.rx.len());
            }
            match self.pending.front_mut() {
                Some(Step::Bytes(bytes)) => {
                    self.rx.extend(bytes.drain(..));
                    self.pending.pop_front();
                }
                Some(Step::Silence(0)) => {
                    self.pending.pop_front();
                }
                Some(Step::Silence(remaining)) => {
                    *remaining -= 1;
                    self.clock += 1;
                    return Ok(0);
                }
                None => {
                    self.clock += 1;
                    return Ok(0);
                }
            }
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.rx.pop_front().ok_or(TransportError::Empty)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.written.extend_from_slice(bytes);
        if let Some(reply) = self.replies.pop_front() {
            self.pending.extend(reply);
        }
        Ok(())
    }

    fn now_millis(&self) -> u64 {
        self.clock
    }

    fn sleep(&mut self, ms: u64) {
        self.clock += ms;
    }
}
