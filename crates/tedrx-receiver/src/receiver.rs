use std::time::{Duration, Instant};

use tedrx_frame::{decode, Deframer, FieldSpec, FrameError, Packet, PACKET_REQUEST, PROTOCOL_TABLE};
use tedrx_transport::Transport;
use tracing::{debug, warn};

use crate::error::Result;
use crate::shutdown::Shutdown;

/// What to do with a frame that fails to deframe or decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error from the current poll.
    #[default]
    Abort,
    /// Log it, drop the frame, and keep scanning.
    Skip,
}

/// Polling behaviour.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Length of one collection window. Default: 60s.
    pub window: Duration,
    /// Wait between requests. Default: 1s.
    pub poll_interval: Duration,
    /// Maximum bytes taken from the transport per request. Default: 4096.
    pub read_chunk: usize,
    /// Control byte sent to ask for a packet.
    pub request_byte: u8,
    pub error_policy: ErrorPolicy,
    /// Packet layout used for decoding.
    pub table: &'static [FieldSpec],
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            read_chunk: 4096,
            request_byte: PACKET_REQUEST,
            error_policy: ErrorPolicy::Abort,
            table: PROTOCOL_TABLE,
        }
    }
}

/// Requests packets from the RDU and decodes what comes back.
///
/// Owns the deframer, so partial frames carry over between requests and
/// between windows.
pub struct PollingReceiver<T> {
    transport: T,
    deframer: Deframer,
    config: ReceiverConfig,
    shutdown: Shutdown,
}

impl<T: Transport> PollingReceiver<T> {
    /// Create a receiver with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ReceiverConfig::default())
    }

    /// Create a receiver with explicit configuration.
    pub fn with_config(transport: T, config: ReceiverConfig) -> Self {
        Self {
            transport,
            deframer: Deframer::new(),
            config,
            shutdown: Shutdown::new(),
        }
    }

    /// Use an externally owned shutdown signal.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// A handle that stops `poll` early when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Request once, read what is available, and decode any completed frames.
    pub fn read_once(&mut self) -> Result<Vec<Packet>> {
        self.transport.write_control(self.config.request_byte)?;
        let raw = self.transport.read_available(self.config.read_chunk)?;

        let mut packets = Vec::new();
        for &byte in raw.iter() {
            let frame = match self.deframer.push(byte) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(err) => {
                    self.handle_error(err)?;
                    continue;
                }
            };

            match decode(&frame.payload, self.config.table) {
                Ok(packet) => packets.push(packet),
                Err(err) => self.handle_error(err)?,
            }
        }

        if !packets.is_empty() {
            debug!(bytes = raw.len(), packets = packets.len(), "decoded packets");
        }
        Ok(packets)
    }

    /// Collect packets for one configured window.
    pub fn poll(&mut self) -> Result<Vec<Packet>> {
        self.poll_for(self.config.window)
    }

    /// Collect packets until `window` has elapsed or shutdown is triggered.
    pub fn poll_for(&mut self, window: Duration) -> Result<Vec<Packet>> {
        let deadline = Instant::now() + window;
        let mut packets = Vec::new();

        while Instant::now() < deadline && !self.shutdown.is_triggered() {
            packets.extend(self.read_once()?);
            if self.shutdown.wait_timeout(self.config.poll_interval) {
                debug!("poll interrupted by shutdown");
                break;
            }
        }

        Ok(packets)
    }

    fn handle_error(&self, err: FrameError) -> Result<()> {
        match self.config.error_policy {
            ErrorPolicy::Abort => Err(err.into()),
            ErrorPolicy::Skip => {
                warn!(error = %err, "skipping malformed frame");
                Ok(())
            }
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Frame extraction state.
    pub fn deframer(&self) -> &Deframer {
        &self.deframer
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the receiver and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use bytes::BytesMut;
    use tedrx_frame::{encode_frame, PayloadBuilder};
    use tedrx_transport::{MemoryTransport, TransportError};

    use super::*;
    use crate::error::ReceiverError;

    fn wire_for(kw_values: &[f64]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for &kw in kw_values {
            let payload = PayloadBuilder::new().set("KWNow", kw).unwrap().build();
            encode_frame(&payload, &mut wire);
        }
        wire.to_vec()
    }

    fn fast_config() -> ReceiverConfig {
        ReceiverConfig {
            window: Duration::from_millis(500),
            poll_interval: Duration::from_millis(1),
            ..ReceiverConfig::default()
        }
    }

    #[test]
    fn read_once_sends_request_byte() {
        let mut receiver = PollingReceiver::new(MemoryTransport::new());
        assert!(receiver.read_once().unwrap().is_empty());
        assert_eq!(receiver.transport().written(), &[PACKET_REQUEST]);
    }

    #[test]
    fn frames_split_across_reads_are_decoded() {
        let wire = wire_for(&[1.5, 2.25]);
        let transport = MemoryTransport::from_stream(wire, 37);
        let chunks = transport.pending_chunks();
        let mut receiver = PollingReceiver::new(transport);

        let mut packets = Vec::new();
        for _ in 0..chunks {
            packets.extend(receiver.read_once().unwrap());
        }

        let kw: Vec<f64> = packets.iter().map(|p| p.kw_now().unwrap()).collect();
        assert_eq!(kw.len(), 2);
        assert!((kw[0] - 1.5).abs() < 1e-9);
        assert!((kw[1] - 2.25).abs() < 1e-9);
    }

    #[test]
    fn poll_gathers_every_packet_in_window() {
        let transport = MemoryTransport::from_stream(wire_for(&[1.0, 2.0, 3.0]), 100);
        let mut receiver = PollingReceiver::with_config(transport, fast_config());

        let packets = receiver.poll().unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(receiver.transport().pending_chunks(), 0);
        assert!(receiver.transport().written().len() >= 3);
    }

    #[test]
    fn wrong_length_frame_aborts_by_default() {
        let mut wire = BytesMut::new();
        encode_frame(&[0u8; 275], &mut wire);
        let mut transport = MemoryTransport::new();
        transport.push_chunk(wire.freeze());

        let mut receiver = PollingReceiver::new(transport);
        let err = receiver.read_once().unwrap_err();
        assert!(matches!(
            err,
            ReceiverError::Frame(FrameError::UnsupportedPayloadLength { got: 275, want: 276 })
        ));
    }

    #[test]
    fn skip_policy_drops_bad_frames_and_resyncs() {
        let mut wire = BytesMut::new();
        encode_frame(&[0u8; 10], &mut wire);
        wire.extend_from_slice(&[0x10, 0x04, 0x01, 0x10, 0x99]);
        wire.extend_from_slice(&wire_for(&[4.0]));

        let mut transport = MemoryTransport::new();
        transport.push_chunk(wire.freeze());

        let config = ReceiverConfig {
            error_policy: ErrorPolicy::Skip,
            ..ReceiverConfig::default()
        };
        let mut receiver = PollingReceiver::with_config(transport, config);
        let packets = receiver.read_once().unwrap();
        assert_eq!(packets.len(), 1);
        assert!((packets[0].kw_now().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_escape_aborts_by_default() {
        let mut transport = MemoryTransport::new();
        transport.push_chunk(vec![0x10, 0x04, 0x10, 0x99]);
        let mut receiver = PollingReceiver::new(transport);
        assert!(matches!(
            receiver.read_once(),
            Err(ReceiverError::Frame(FrameError::UnknownEscapeByte(0x99)))
        ));
        assert!(!receiver.deframer().in_frame());
    }

    #[test]
    fn transport_failure_propagates() {
        let mut transport = MemoryTransport::new();
        transport.close();
        let mut receiver = PollingReceiver::new(transport);
        assert!(matches!(
            receiver.read_once(),
            Err(ReceiverError::Transport(TransportError::Shutdown))
        ));
    }

    #[test]
    fn triggered_shutdown_skips_polling() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let mut receiver =
            PollingReceiver::with_config(MemoryTransport::new(), fast_config()).with_shutdown(shutdown);
        assert!(receiver.poll().unwrap().is_empty());
        assert!(receiver.transport().written().is_empty());
    }

    #[test]
    fn shutdown_interrupts_interval_wait() {
        let config = ReceiverConfig {
            window: Duration::from_secs(120),
            poll_interval: Duration::from_secs(60),
            ..ReceiverConfig::default()
        };
        let mut receiver = PollingReceiver::with_config(MemoryTransport::new(), config);
        let shutdown = receiver.shutdown_handle();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            shutdown.trigger();
        });

        let start = Instant::now();
        receiver.poll().unwrap();
        assert!(start.elapsed() < Duration::from_secs(30));
        stopper.join().unwrap();
    }
}
