//! Serial telemetry receiver for TED energy monitors.
//!
//! tedrx talks to a TED receive unit (RDU) over its serial port, extracts the
//! escape-framed packets it streams, and decodes them into scaled readings.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-duplex transport boundary (serial, in-memory)
//! - [`frame`]: Frame extraction and fixed-layout packet decoding
//! - [`receiver`]: Polling, channel aggregation and snapshots (behind `receiver` feature)

/// Re-export transport types.
pub mod transport {
    pub use tedrx_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tedrx_frame::*;
}

/// Re-export receiver types (requires `receiver` feature).
#[cfg(feature = "receiver")]
pub mod receiver {
    pub use tedrx_receiver::*;
}
