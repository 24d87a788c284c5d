use std::io::{Read, Write};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Serial line settings for the module UART.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. The module ships configured for 115200.
    pub baud_rate: u32,
    /// Timeout for a single blocking read or write on the port.
    pub io_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            io_timeout: Duration::from_millis(100),
        }
    }
}

/// [`Transport`] over a host serial port (8N1, no flow control).
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    epoch: Instant,
}

impl SerialTransport {
    /// Open a serial device with default settings.
    pub fn open(name: &str) -> Result<Self> {
        Self::open_with_config(name, &SerialConfig::default())
    }

    /// Open a serial device with explicit settings.
    pub fn open_with_config(name: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(name, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.io_timeout)
            .open()
            .map_err(|e| serial_error(name, e))?;

        info!(port = name, baud = config.baud_rate, "opened serial transport");

        Ok(Self {
            port,
            name: name.to_string(),
            epoch: Instant::now(),
        })
    }

    /// Device name this transport was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| serial_error(&self.name, e))
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn discard_input(&mut self) -> Result<usize> {
        let pending = self.bytes_available()?;
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| serial_error(&self.name, e))?;
        if pending > 0 {
            debug!(port = %self.name, pending, "discarded stale input");
        }
        Ok(pending)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .finish()
    }
}

fn serial_error(port: &str, err: serialport::Error) -> TransportError {
    TransportError::Serial {
        port: port.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_module_uart() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.io_timeout, Duration::from_millis(100));
    }

    #[test]
    fn open_missing_device_reports_port_name() {
        let err = SerialTransport::open("/dev/sipf-does-not-exist").unwrap_err();
        match err {
            TransportError::Serial { port, .. } => assert_eq!(port, "/dev/sipf-does-not-exist"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
