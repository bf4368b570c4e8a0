use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// An in-memory transport fed from queued chunks.
///
/// Each `read_available` call hands out at most one queued chunk (split at
/// `max_bytes` if needed), which makes chunk boundaries deterministic. Control
/// bytes written by the caller are recorded for inspection.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Bytes>,
    written: Vec<u8>,
    closed: bool,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a captured byte stream in fixed-size chunks.
    pub fn from_stream(stream: impl Into<Bytes>, chunk_size: usize) -> Self {
        let mut stream = stream.into();
        let chunk_size = chunk_size.max(1);
        let mut transport = Self::new();
        while !stream.is_empty() {
            let take = chunk_size.min(stream.len());
            transport.push_chunk(stream.split_to(take));
        }
        transport
    }

    /// Queue a chunk to be returned by a later read.
    pub fn push_chunk(&mut self, chunk: impl Into<Bytes>) {
        self.inbound.push_back(chunk.into());
    }

    /// Number of chunks not yet read.
    pub fn pending_chunks(&self) -> usize {
        self.inbound.len()
    }

    /// Control bytes written so far, in order.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Make every subsequent operation fail with `TransportError::Shutdown`.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Transport for MemoryTransport {
    fn write_control(&mut self, byte: u8) -> Result<()> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        self.written.push(byte);
        Ok(())
    }

    fn read_available(&mut self, max_bytes: usize) -> Result<Bytes> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        let Some(mut chunk) = self.inbound.pop_front() else {
            return Ok(Bytes::new());
        };
        if chunk.len() > max_bytes {
            let rest = chunk.split_off(max_bytes);
            self.inbound.push_front(rest);
        }
        Ok(chunk)
    }
}
