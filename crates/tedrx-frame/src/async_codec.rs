use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, Deframer, Frame};
use crate::error::FrameError;

/// `tokio_util` codec over the escape framing, for async serial streams.
///
/// Consumes input only up to the end of the frame it returns, so the rest of
/// the buffer is left for the next call.
#[derive(Debug, Default)]
pub struct TedCodec {
    deframer: Deframer,
}

impl TedCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for TedCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        let mut consumed = 0usize;
        let mut result = Ok(None);
        for &byte in src.iter() {
            consumed += 1;
            match self.deframer.push(byte) {
                Ok(None) => {}
                Ok(Some(frame)) => {
                    result = Ok(Some(frame));
                    break;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        src.advance(consumed);
        result
    }
}

impl Encoder<Bytes> for TedCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(&item, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_frame_per_call() {
        let mut codec = TedCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Bytes::from_static(b"a\x10"), &mut buf).unwrap();
        codec.encode(Bytes::from_static(b"b"), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), b"a\x10");
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.payload.as_ref(), b"b");
        assert!(buf.is_empty());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn partial_input_is_consumed_and_remembered() {
        let mut codec = TedCodec::new();
        let mut buf = BytesMut::from(&[0x10, 0x04, 0x01, 0x10][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(&[0x03]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), &[0x01]);
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let mut codec = TedCodec::new();
        let mut buf = BytesMut::from(&[0x10, 0x04, 0x10, 0x77, 0x10, 0x04][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::UnknownEscapeByte(0x77))
        ));
        assert_eq!(buf.as_ref(), &[0x10, 0x04]);
    }
}
