//! Escape-delimited frame extraction and fixed-layout packet decoding.
//!
//! The RDU streams packets wrapped in a byte-stuffed framing scheme:
//! - `0x10 0x04` starts a frame
//! - `0x10 0x03` ends a frame
//! - `0x10 0x10` is a literal `0x10` inside a frame
//!
//! [`Deframer`] turns arbitrarily chunked input into frame payloads, and
//! [`decode`] turns one 276-byte payload into a [`Packet`] of scaled fields.

pub mod codec;
pub mod error;
pub mod packet;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{encode_frame, Deframer, Frame, ESCAPE, FRAME_END, FRAME_START, PACKET_REQUEST};
pub use error::{FrameError, Result};
pub use packet::{
    decode, decode_at, FieldSpec, FieldWidth, Packet, PayloadBuilder, PACKET_LEN, PROTOCOL_TABLE,
    TIMESTAMP_FIELD,
};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::TedCodec;
