//! Byte-duplex transport boundary for TED energy monitor receivers.
//!
//! The receive unit (RDU) is reached over a plain serial link. Everything above
//! this crate only needs two primitives: write one control byte, and read
//! whatever bytes are currently available without blocking. The [`Transport`]
//! trait captures exactly that, with two implementations:
//! - [`SerialTransport`] for a real port (via `serialport`)
//! - [`MemoryTransport`] for captured streams and tests

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use serial::{SerialConfig, SerialTransport, DEFAULT_BAUD_RATE};
pub use traits::Transport;
