use crate::error::Result;

/// A duplex byte stream with a monotonic clock.
///
/// This is the only capability the protocol engine requires from its
/// environment. Implementations must never block in [`bytes_available`];
/// the line reader polls it in a loop and measures silence with
/// [`now_millis`].
///
/// [`bytes_available`]: Transport::bytes_available
/// [`now_millis`]: Transport::now_millis
pub trait Transport {
    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read the next received byte.
    ///
    /// Only called after [`bytes_available`](Transport::bytes_available)
    /// reported at least one byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Write all bytes to the stream.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Monotonic clock in milliseconds. The epoch is arbitrary.
    fn now_millis(&self) -> u64;

    /// Block the calling thread for `ms` milliseconds.
    fn sleep(&mut self, ms: u64);

    /// Read and discard every byte currently buffered.
    ///
    /// Returns the number of bytes discarded.
    fn discard_input(&mut self) -> Result<usize> {
        let pending = self.bytes_available()?;
        for _ in 0..pending {
            self.read_byte()?;
        }
        Ok(pending)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }

    fn sleep(&mut self, ms: u64) {
        (**self).sleep(ms)
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }

    fn sleep(&mut self, ms: u64) {
        (**self).sleep(ms)
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }
}
