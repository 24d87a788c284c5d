use bytes::BytesMut;
use sipf_transport::Transport;
use tracing::{debug, trace};

use crate::codec::{encode_command, FrameConfig, Tier};
use crate::error::Result;
use crate::reader::{Line, LineReader};
use crate::reply::Reply;

/// Sends command lines and reads classified replies over a [`Transport`].
///
/// The protocol has no request identifiers, so exactly one command may be
/// in flight. Holding the channel by `&mut` for the whole exchange enforces
/// that for a single owner.
pub struct CommandChannel<T> {
    inner: T,
    reader: LineReader,
    config: FrameConfig,
    buf: BytesMut,
}

impl<T: Transport> CommandChannel<T> {
    /// Create a channel with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            reader: LineReader::with_capacity(config.max_line_len),
            config,
            buf: BytesMut::new(),
        }
    }

    /// Write a command line.
    ///
    /// Any bytes already buffered belong to an earlier exchange and are
    /// discarded first.
    pub fn send(&mut self, command: &str) -> Result<()> {
        let stale = self.inner.discard_input()?;
        if stale > 0 {
            debug!(stale, "dropped stale input before command");
        }

        self.buf.clear();
        encode_command(command, &mut self.buf);
        self.inner.write_bytes(&self.buf)?;
        Ok(())
    }

    /// Read one raw line under the given timeout tier.
    pub fn read_line(&mut self, tier: Tier) -> Result<Line> {
        let timeout_ms = self.config.timeout_ms(tier);
        self.reader.read_line(&mut self.inner, timeout_ms)
    }

    /// Read and classify one line.
    pub fn read_reply(&mut self, tier: Tier) -> Result<Reply> {
        let reply = Reply::classify(self.read_line(tier)?);
        trace!(kind = reply.kind(), ?reply, "reply line");
        Ok(reply)
    }

    /// Read the next meaningful reply, skipping echoes and blank lines.
    pub fn next_reply(&mut self, tier: Tier) -> Result<Reply> {
        loop {
            match self.read_reply(tier)? {
                Reply::Echo => continue,
                Reply::Data(line) if line.is_blank() => continue,
                reply => return Ok(reply),
            }
        }
    }

    /// Block for `ms` milliseconds on the transport clock.
    pub fn pause(&mut self, ms: u64) {
        self.inner.sleep(ms);
    }

    /// Current transport clock in milliseconds.
    pub fn now_millis(&self) -> u64 {
        self.inner.now_millis()
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the channel and return the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current framing configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T> std::fmt::Debug for CommandChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
