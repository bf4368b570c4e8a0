use bytes::Bytes;

use crate::error::Result;

/// A byte-duplex link to the receive unit.
///
/// Reads are contractually non-blocking: `read_available` returns immediately
/// with whatever is buffered, which may be nothing.
pub trait Transport {
    /// Write a single control byte (e.g. a packet request).
    fn write_control(&mut self, byte: u8) -> Result<()>;

    /// Read up to `max_bytes` currently-available bytes. Never blocks.
    fn read_available(&mut self, max_bytes: usize) -> Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_control(&mut self, byte: u8) -> Result<()> {
        (**self).write_control(byte)
    }

    fn read_available(&mut self, max_bytes: usize) -> Result<Bytes> {
        (**self).read_available(max_bytes)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_control(&mut self, byte: u8) -> Result<()> {
        (**self).write_control(byte)
    }

    fn read_available(&mut self, max_bytes: usize) -> Result<Bytes> {
        (**self).read_available(max_bytes)
    }
}
