use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::codec::{Deframer, Frame};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete frames from any `Read` stream (capture files, pipes).
///
/// Partial frames are carried across reads; callers always get whole frames.
/// An unknown escape byte is reported after the frames completed before it,
/// and the next call resumes with the bytes that followed it.
pub struct FrameReader<T> {
    inner: T,
    deframer: Deframer,
    ready: VecDeque<Frame>,
    pending_error: Option<FrameError>,
    chunk: Box<[u8]>,
    filled: usize,
    pos: usize,
    eof: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            deframer: Deframer::new(),
            ready: VecDeque::new(),
            pending_error: None,
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
            filled: 0,
            pos: 0,
            eof: false,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` once the stream is exhausted. A frame left open at
    /// EOF is dropped.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(Some(frame));
            }
            if let Some(err) = self.pending_error.take() {
                return Err(err);
            }
            if self.pos < self.filled {
                self.scan_chunk();
                continue;
            }
            if self.eof {
                return Ok(None);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.deframer.in_frame() {
                    tracing::debug!(
                        buffered = self.deframer.buffered_len(),
                        "stream ended inside a frame"
                    );
                }
                self.eof = true;
                continue;
            }

            self.filled = read;
            self.pos = 0;
        }
    }

    // Stops at the first escape error, leaving the rest of the chunk unread.
    fn scan_chunk(&mut self) {
        while self.pos < self.filled {
            let byte = self.chunk[self.pos];
            self.pos += 1;
            match self.deframer.push(byte) {
                Ok(Some(frame)) => self.ready.push_back(frame),
                Ok(None) => {}
                Err(err) => {
                    self.pending_error = Some(err);
                    return;
                }
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}
