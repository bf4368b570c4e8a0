//! Polling receiver and output plumbing for TED energy monitors.
//!
//! This is the layer that talks to the RDU: request packets on an interval,
//! decode whatever arrives, and hand per-channel samples and the latest
//! reading to the outside world.

pub mod channels;
pub mod error;
pub mod monitor;
pub mod receiver;
pub mod shutdown;
pub mod sink;
pub mod snapshot;

pub use channels::{ChannelAggregator, ChannelSpec, Sample, DEFAULT_CHANNELS};
pub use error::{ReceiverError, Result};
pub use monitor::{Monitor, WindowSummary};
pub use receiver::{ErrorPolicy, PollingReceiver, ReceiverConfig};
pub use shutdown::Shutdown;
pub use sink::{JsonLinesSink, MemorySink, SampleSink};
pub use snapshot::{render_dashboard_xml, DashboardXml, JsonSnapshot, SnapshotPublisher};
