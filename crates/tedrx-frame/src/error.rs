/// Errors that can occur while extracting frames or decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An escape byte was followed by a byte with no defined meaning.
    #[error("unknown escape byte 0x{0:02x}")]
    UnknownEscapeByte(u8),

    /// A frame payload does not have the fixed protocol length.
    #[error("unsupported payload length ({got} bytes, want {want})")]
    UnsupportedPayloadLength { got: usize, want: usize },

    /// A field table entry reaches past the end of the payload.
    #[error("field {name} at offset {offset} (width {width}) exceeds payload of {len} bytes")]
    FieldOutOfBounds {
        name: &'static str,
        offset: usize,
        width: usize,
        len: usize,
    },

    /// A field name is not present in the table.
    #[error("unknown field {0}")]
    UnknownField(String),

    /// A value cannot be represented in the field's integer width.
    #[error("value {value} out of range for field {name}")]
    ValueOutOfRange { name: &'static str, value: f64 },

    /// An I/O error occurred while reading or writing a byte stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
