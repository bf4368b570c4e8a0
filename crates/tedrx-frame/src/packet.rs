use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, Bytes};
use serde::{Serialize, Serializer};

use crate::error::{FrameError, Result};

/// The only payload length this firmware family produces.
pub const PACKET_LEN: usize = 276;

/// Name under which the capture time is stored in every packet.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Width of a little-endian unsigned field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U16,
    U32,
}

impl FieldWidth {
    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            FieldWidth::U16 => 2,
            FieldWidth::U32 => 4,
        }
    }

    /// Largest raw value the width can carry.
    pub const fn max_raw(self) -> u64 {
        match self {
            FieldWidth::U16 => u16::MAX as u64,
            FieldWidth::U32 => u32::MAX as u64,
        }
    }
}

/// One entry of a packet layout table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Byte offset from the start of the payload (framing excluded).
    pub offset: usize,
    pub name: &'static str,
    pub width: FieldWidth,
    /// Decimal factor applied to the raw integer.
    pub scale: f64,
}

impl FieldSpec {
    pub const fn new(offset: usize, name: &'static str, width: FieldWidth, scale: f64) -> Self {
        Self {
            offset,
            name,
            width,
            scale,
        }
    }

    fn range(&self, len: usize) -> Result<std::ops::Range<usize>> {
        self.offset
            .checked_add(self.width.bytes())
            .filter(|&end| end <= len)
            .map(|end| self.offset..end)
            .ok_or(FrameError::FieldOutOfBounds {
                name: self.name,
                offset: self.offset,
                width: self.width.bytes(),
                len,
            })
    }

    /// Read the raw little-endian integer for this field.
    pub fn read_raw(&self, payload: &[u8]) -> Result<u64> {
        let mut raw = &payload[self.range(payload.len())?];
        Ok(match self.width {
            FieldWidth::U16 => u64::from(raw.get_u16_le()),
            FieldWidth::U32 => u64::from(raw.get_u32_le()),
        })
    }

    /// Read and scale this field.
    pub fn read(&self, payload: &[u8]) -> Result<f64> {
        Ok(self.read_raw(payload)? as f64 * self.scale)
    }
}

/// Packet layout for RDU firmware 8.01U.
///
/// `DlrMtd` appears twice. Decoding is last-wins, so the 4-byte field at
/// offset 170 is the value reported; the 2-byte entry at 253 is never visible.
pub const PROTOCOL_TABLE: &[FieldSpec] = &[
    FieldSpec::new(82, "CurrentRate", FieldWidth::U16, 0.0001),
    FieldSpec::new(247, "KWNow", FieldWidth::U16, 0.01),
    FieldSpec::new(249, "DlrNow", FieldWidth::U16, 0.01),
    FieldSpec::new(251, "VrmsNowDsp", FieldWidth::U16, 0.1),
    FieldSpec::new(253, "DlrMtd", FieldWidth::U16, 0.1),
    FieldSpec::new(255, "DlrProj", FieldWidth::U16, 0.1),
    FieldSpec::new(257, "KWProj", FieldWidth::U16, 1.0),
    FieldSpec::new(132, "LoVrmsTdy", FieldWidth::U16, 0.1),
    FieldSpec::new(136, "HiVrmsTdy", FieldWidth::U16, 0.1),
    FieldSpec::new(140, "LoVrmsMtd", FieldWidth::U16, 0.1),
    FieldSpec::new(143, "HiVrmsMtd", FieldWidth::U16, 0.1),
    FieldSpec::new(146, "KwPeakTdy", FieldWidth::U16, 0.01),
    FieldSpec::new(148, "DlrPeakTdy", FieldWidth::U16, 0.01),
    FieldSpec::new(150, "KwPeakMtd", FieldWidth::U16, 0.01),
    FieldSpec::new(152, "DlrPeakMtd", FieldWidth::U16, 0.01),
    FieldSpec::new(154, "DlrTdy", FieldWidth::U32, 0.00000167),
    FieldSpec::new(158, "KWTdy", FieldWidth::U32, 0.0000167),
    FieldSpec::new(166, "KWMtd", FieldWidth::U32, 0.0000167),
    FieldSpec::new(170, "DlrMtd", FieldWidth::U32, 0.00000167),
];

/// One decoded reading: scaled fields by name plus the capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    fields: BTreeMap<&'static str, f64>,
    captured_at: SystemTime,
}

impl Packet {
    /// Look up a field by name. `timestamp` is always present.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// All fields, including `timestamp`.
    pub fn fields(&self) -> &BTreeMap<&'static str, f64> {
        &self.fields
    }

    /// Wall-clock time at which the packet was decoded.
    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    /// Capture time as fractional unix seconds.
    pub fn timestamp(&self) -> f64 {
        unix_seconds(self.captured_at)
    }

    /// Instantaneous demand in kilowatts.
    pub fn kw_now(&self) -> Option<f64> {
        self.get("KWNow")
    }

    /// Instantaneous cost rate in dollars per hour.
    pub fn dollars_now(&self) -> Option<f64> {
        self.get("DlrNow")
    }
}

impl Serialize for Packet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter())
    }
}

/// Decode one frame payload, stamping it with the current time.
pub fn decode(payload: &[u8], table: &[FieldSpec]) -> Result<Packet> {
    decode_at(payload, table, SystemTime::now())
}

/// Decode one frame payload with an explicit capture time.
///
/// Entries are applied in table order; a repeated name overwrites the earlier
/// value. Any failure discards the whole packet.
pub fn decode_at(payload: &[u8], table: &[FieldSpec], captured_at: SystemTime) -> Result<Packet> {
    if payload.len() != PACKET_LEN {
        return Err(FrameError::UnsupportedPayloadLength {
            got: payload.len(),
            want: PACKET_LEN,
        });
    }

    let mut fields = BTreeMap::new();
    for spec in table {
        fields.insert(spec.name, spec.read(payload)?);
    }
    fields.insert(TIMESTAMP_FIELD, unix_seconds(captured_at));

    Ok(Packet {
        fields,
        captured_at,
    })
}

fn unix_seconds(at: SystemTime) -> f64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Builds a zero-filled payload with chosen field values.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    buf: Vec<u8>,
    table: &'static [FieldSpec],
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    /// Start from an all-zero payload laid out by [`PROTOCOL_TABLE`].
    pub fn new() -> Self {
        Self::with_table(PROTOCOL_TABLE)
    }

    pub fn with_table(table: &'static [FieldSpec]) -> Self {
        Self {
            buf: vec![0; PACKET_LEN],
            table,
        }
    }

    /// Set a field by name to a scaled value.
    ///
    /// Uses the last table entry with that name, the one decoding reports.
    pub fn set(self, name: &str, value: f64) -> Result<Self> {
        let spec = *self
            .table
            .iter()
            .rev()
            .find(|spec| spec.name == name)
            .ok_or_else(|| FrameError::UnknownField(name.to_string()))?;

        let raw = (value / spec.scale).round();
        if !raw.is_finite() || raw < 0.0 || raw > spec.width.max_raw() as f64 {
            return Err(FrameError::ValueOutOfRange {
                name: spec.name,
                value,
            });
        }
        self.set_spec_raw(&spec, raw as u64)
    }

    /// Write a raw little-endian integer at an arbitrary offset.
    pub fn set_raw(self, offset: usize, width: FieldWidth, raw: u32) -> Result<Self> {
        let spec = FieldSpec::new(offset, "raw", width, 1.0);
        if u64::from(raw) > width.max_raw() {
            return Err(FrameError::ValueOutOfRange {
                name: spec.name,
                value: f64::from(raw),
            });
        }
        self.set_spec_raw(&spec, u64::from(raw))
    }

    fn set_spec_raw(mut self, spec: &FieldSpec, raw: u64) -> Result<Self> {
        let range = spec.range(self.buf.len())?;
        let bytes = raw.to_le_bytes();
        self.buf[range].copy_from_slice(&bytes[..spec.width.bytes()]);
        Ok(self)
    }

    pub fn build(self) -> Bytes {
        Bytes::from(self.buf)
    }
}
