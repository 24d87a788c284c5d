use sipf_frame::CommandChannel;
use sipf_transport::Transport;
use tracing::debug;

use crate::command::Command;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::rx::ObjectArena;
use crate::version::FirmwareVersion;

/// Driver for one SIPF module.
///
/// Owns the command channel and the cached firmware version. Every
/// operation takes `&mut self`: one command in flight at a time. Callers
/// sharing a module across threads wrap the client in a mutex.
pub struct SipfClient<T> {
    pub(crate) channel: CommandChannel<T>,
    pub(crate) config: ClientConfig,
    pub(crate) version: Option<FirmwareVersion>,
}

impl<T: Transport> SipfClient<T> {
    /// Create a client with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client with explicit configuration.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self {
            channel: CommandChannel::with_config(transport, config.frame.clone()),
            config,
            version: None,
        }
    }

    /// Firmware version cached by the last successful
    /// [`get_firmware_version`](SipfClient::get_firmware_version).
    pub fn cached_version(&self) -> Option<FirmwareVersion> {
        self.version
    }

    /// Forget the cached firmware version, e.g. after a module firmware update.
    pub fn invalidate_version(&mut self) {
        self.version = None;
    }

    /// Allocate a decode arena sized from configuration.
    pub fn new_arena(&self) -> ObjectArena {
        ObjectArena::with_capacity(self.config.arena_capacity)
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        self.channel.get_ref()
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        self.channel.get_mut()
    }

    /// Consume the client and return the transport.
    pub fn into_inner(self) -> T {
        self.channel.into_inner()
    }

    pub(crate) fn send(&mut self, command: &Command) -> Result<()> {
        debug!(command = %command.label(), "sending command");
        self.channel.send(&command.encode())?;
        Ok(())
    }

    pub(crate) fn pace(&mut self) {
        self.channel.pause(self.config.pacing_delay_ms);
    }
}

impl<T> std::fmt::Debug for SipfClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SipfClient")
            .field("config", &self.config)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use sipf_transport::ScriptedTransport;

    use super::*;

    #[test]
    fn new_arena_uses_configured_capacity() {
        let cfg = ClientConfig {
            arena_capacity: 64,
            ..ClientConfig::default()
        };
        let client = SipfClient::with_config(ScriptedTransport::new(), cfg);
        assert_eq!(client.new_arena().capacity(), 64);
    }

    #[test]
    fn version_cache_starts_empty_and_can_be_cleared() {
        let mut client = SipfClient::new(ScriptedTransport::new());
        assert!(client.cached_version().is_none());
        client.version = Some(FirmwareVersion::from_raw(0x0003_0001));
        client.invalidate_version();
        assert!(client.cached_version().is_none());
    }

    #[test]
    fn send_writes_encoded_command() {
        let mut client = SipfClient::new(ScriptedTransport::new());
        client.send(&Command::GnssLocation).unwrap();
        assert_eq!(client.transport().written(), b"$$GNSSLOC\r\n");
    }
}
