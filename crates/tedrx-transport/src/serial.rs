use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Line rate of the RDU serial interface.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate. Default: 19200.
    pub baud_rate: u32,
    /// Driver-level read timeout. Default: zero (never block).
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::ZERO,
        }
    }
}

/// A serial port connected to the receive unit.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open a serial port with default settings (19200 8N1, non-blocking reads).
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open a serial port with explicit settings.
    pub fn open_with_config(path: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: path.to_string(),
                source,
            })?;

        info!(port = path, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    /// The path this transport was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn write_control(&mut self, byte: u8) -> Result<()> {
        self.port.write_all(&[byte])?;
        self.port.flush()?;
        Ok(())
    }

    fn read_available(&mut self, max_bytes: usize) -> Result<Bytes> {
        let pending = self.port.bytes_to_read()? as usize;
        let want = pending.min(max_bytes);
        if want == 0 {
            return Ok(Bytes::new());
        }

        let mut buf = BytesMut::zeroed(want);
        loop {
            match self.port.read(&mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    debug!(port = %self.name, bytes = n, "read from serial port");
                    return Ok(buf.freeze());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(Bytes::new());
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_rdu_line_settings() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 19_200);
        assert_eq!(cfg.read_timeout, Duration::ZERO);
    }

    #[test]
    #[cfg(unix)]
    fn open_missing_port_reports_path() {
        let err = SerialTransport::open("/dev/tedrx-does-not-exist").unwrap_err();
        match err {
            TransportError::Open { port, .. } => assert_eq!(port, "/dev/tedrx-does-not-exist"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
