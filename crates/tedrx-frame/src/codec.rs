use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};

/// Escape byte. Always special at the top level; doubled to carry a literal.
pub const ESCAPE: u8 = 0x10;

/// Follows [`ESCAPE`] to start a frame.
pub const FRAME_START: u8 = 0x04;

/// Follows [`ESCAPE`] to end a frame.
pub const FRAME_END: u8 = 0x03;

/// Control byte asking the RDU to send any packet it has buffered.
pub const PACKET_REQUEST: u8 = 0xAA;

const INITIAL_FRAME_CAPACITY: usize = 512;

/// One de-escaped frame payload, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The payload bytes between the start and end sequences.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True if the frame carried no bytes.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The number of bytes this frame occupies on the wire once escaped.
    pub fn wire_size(&self) -> usize {
        4 + self.payload.len() + self.payload.iter().filter(|&&b| b == ESCAPE).count()
    }
}

/// Escape a payload into the wire format.
///
/// Wire format:
/// ```text
/// 0x10 0x04 | payload, each 0x10 sent as 0x10 0x10 | 0x10 0x03
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(4 + payload.len() + payload.len() / 8);
    dst.put_slice(&[ESCAPE, FRAME_START]);
    for &byte in payload {
        if byte == ESCAPE {
            dst.put_slice(&[ESCAPE, ESCAPE]);
        } else {
            dst.put_u8(byte);
        }
    }
    dst.put_slice(&[ESCAPE, FRAME_END]);
}

/// Streaming frame extractor.
///
/// State survives across calls: a frame, or even a two-byte escape sequence,
/// may straddle any number of reads. Bytes outside a frame are dropped.
///
/// After an [`FrameError::UnknownEscapeByte`] the deframer is idle again (no
/// open frame, no pending escape), so it picks up at the next frame start.
#[derive(Debug, Default)]
pub struct Deframer {
    escaping: bool,
    buffer: Option<BytesMut>,
}

impl Deframer {
    /// Create an idle deframer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one byte, returning a frame if this byte completed one.
    pub fn push(&mut self, byte: u8) -> Result<Option<Frame>> {
        if self.escaping {
            self.escaping = false;
            match byte {
                ESCAPE => {
                    if let Some(buf) = self.buffer.as_mut() {
                        buf.put_u8(ESCAPE);
                    }
                }
                FRAME_START => {
                    let fresh = BytesMut::with_capacity(INITIAL_FRAME_CAPACITY);
                    if let Some(stale) = self.buffer.replace(fresh) {
                        debug!(discarded = stale.len(), "frame restarted before it was closed");
                    }
                }
                FRAME_END => {
                    if let Some(buf) = self.buffer.take() {
                        debug!(len = buf.len(), "frame complete");
                        return Ok(Some(Frame {
                            payload: buf.freeze(),
                        }));
                    }
                }
                other => {
                    self.buffer = None;
                    return Err(FrameError::UnknownEscapeByte(other));
                }
            }
        } else if byte == ESCAPE {
            self.escaping = true;
        } else if let Some(buf) = self.buffer.as_mut() {
            buf.put_u8(byte);
        }
        Ok(None)
    }

    /// Process a chunk, returning every frame it completed in order.
    ///
    /// On an unknown escape byte the rest of the chunk is abandoned and only
    /// the error is returned.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if let Some(frame) = self.push(byte)? {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    /// True if the last byte seen was an unresolved escape.
    pub fn is_escaping(&self) -> bool {
        self.escaping
    }

    /// True if a frame has been started but not yet ended.
    pub fn in_frame(&self) -> bool {
        self.buffer.is_some()
    }

    /// Bytes accumulated in the open frame, if any.
    pub fn buffered_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, BytesMut::len)
    }

    /// Drop any partial frame and pending escape.
    pub fn reset(&mut self) {
        self.escaping = false;
        self.buffer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![ESCAPE, FRAME_START];
        out.extend_from_slice(payload);
        out.extend_from_slice(&[ESCAPE, FRAME_END]);
        out
    }

    fn payloads(frames: &[Frame]) -> Vec<Vec<u8>> {
        frames.iter().map(|f| f.payload.to_vec()).collect()
    }

    #[test]
    fn unescaped_payload_yields_one_frame() {
        let cases: [&[u8]; 4] = [b"", b"A", b"hello world", &[0x00, 0x03, 0x04, 0xAA, 0xFF]];
        for payload in cases {
            let mut deframer = Deframer::new();
            let frames = deframer.feed(&wrap(payload)).unwrap();
            assert_eq!(payloads(&frames), vec![payload.to_vec()]);
            assert!(!deframer.in_frame());
        }
    }

    #[test]
    fn literal_escape_is_unstuffed() {
        let mut deframer = Deframer::new();
        let frames = deframer
            .feed(&[0x10, 0x04, 0x41, 0x10, 0x10, 0x42, 0x10, 0x03])
            .unwrap();
        assert_eq!(payloads(&frames), vec![vec![0x41, 0x10, 0x42]]);
    }

    #[test]
    fn unknown_escape_fails() {
        let mut deframer = Deframer::new();
        let err = deframer.feed(&[0x10, 0x04, 0x10, 0x99]).unwrap_err();
        assert!(matches!(err, FrameError::UnknownEscapeByte(0x99)));
    }

    #[test]
    fn unknown_escape_leaves_deframer_idle() {
        let mut deframer = Deframer::new();
        deframer.feed(&[0x10, 0x04, 0x01, 0x02, 0x10, 0x99]).unwrap_err();
        assert!(!deframer.in_frame());
        assert!(!deframer.is_escaping());

        let frames = deframer.feed(&[0x05, 0x10, 0x03, 0x10, 0x04, 0x07, 0x10, 0x03]).unwrap();
        assert_eq!(payloads(&frames), vec![vec![0x07]]);
    }

    #[test]
    fn split_anywhere_matches_whole_feed() {
        let mut wire = BytesMut::new();
        encode_frame(&[0x01, 0x10, 0x02], &mut wire);
        wire.put_slice(&[0x55, 0x66]);
        encode_frame(&[0x10, 0x10, 0x10], &mut wire);
        encode_frame(b"third", &mut wire);
        let wire = wire.to_vec();

        let expected = payloads(&Deframer::new().feed(&wire).unwrap());
        assert_eq!(expected.len(), 3);

        for split in 0..=wire.len() {
            let mut deframer = Deframer::new();
            let mut frames = deframer.feed(&wire[..split]).unwrap();
            frames.extend(deframer.feed(&wire[split..]).unwrap());
            assert_eq!(payloads(&frames), expected, "split at {split}");
        }

        let mut deframer = Deframer::new();
        let mut frames = Vec::new();
        for byte in &wire {
            frames.extend(deframer.feed(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(payloads(&frames), expected);
    }

    #[test]
    fn escape_sequence_straddles_feeds() {
        let mut deframer = Deframer::new();
        assert!(deframer.feed(&[0x10]).unwrap().is_empty());
        assert!(deframer.is_escaping());
        assert!(deframer.feed(&[0x04, 0x33, 0x10]).unwrap().is_empty());
        assert!(deframer.in_frame());
        let frames = deframer.feed(&[0x03]).unwrap();
        assert_eq!(payloads(&frames), vec![vec![0x33]]);
    }

    #[test]
    fn noise_between_frames_is_dropped() {
        let mut deframer = Deframer::new();
        let mut wire = vec![0x01, 0x02, 0x03];
        wire.extend(wrap(b"x"));
        wire.extend([0xEE, 0x10, 0x10, 0xEE]);
        wire.extend(wrap(b"y"));
        let frames = deframer.feed(&wire).unwrap();
        assert_eq!(payloads(&frames), vec![b"x".to_vec(), b"y".to_vec()]);
    }

    #[test]
    fn end_without_start_is_ignored() {
        let mut deframer = Deframer::new();
        assert!(deframer.feed(&[0x10, 0x03, 0x10, 0x03]).unwrap().is_empty());
    }

    #[test]
    fn restart_discards_open_frame() {
        let mut deframer = Deframer::new();
        let frames = deframer
            .feed(&[0x10, 0x04, 0xAA, 0xBB, 0x10, 0x04, 0xCC, 0x10, 0x03])
            .unwrap();
        assert_eq!(payloads(&frames), vec![vec![0xCC]]);
    }

    #[test]
    fn buffered_len_tracks_open_frame() {
        let mut deframer = Deframer::new();
        deframer.feed(&[0x10, 0x04, 0x01, 0x10, 0x10]).unwrap();
        assert_eq!(deframer.buffered_len(), 2);
        deframer.reset();
        assert_eq!(deframer.buffered_len(), 0);
        assert!(!deframer.in_frame());
    }

    #[test]
    fn encode_doubles_escape_bytes() {
        let mut buf = BytesMut::new();
        encode_frame(&[0x41, 0x10, 0x42], &mut buf);
        assert_eq!(
            buf.as_ref(),
            &[0x10, 0x04, 0x41, 0x10, 0x10, 0x42, 0x10, 0x03]
        );
        assert_eq!(Frame::new(vec![0x41, 0x10, 0x42]).wire_size(), buf.len());
    }
}
