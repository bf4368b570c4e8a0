/// Errors that can occur while receiving and publishing readings.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] tedrx_transport::TransportError),

    /// Framing or packet decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] tedrx_frame::FrameError),

    /// I/O error while writing samples or snapshots.
    #[error("output I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReceiverError>;
