use tedrx_transport::Transport;
use tracing::info;

use crate::channels::ChannelAggregator;
use crate::error::Result;
use crate::receiver::PollingReceiver;
use crate::shutdown::Shutdown;
use crate::sink::SampleSink;
use crate::snapshot::SnapshotPublisher;

/// What one collection window produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowSummary {
    pub packets: usize,
    /// Samples handed to the sink across all channels.
    pub samples: usize,
}

/// The receive loop: poll a window, store per-channel samples, publish the
/// latest reading, repeat until shutdown.
///
/// Batching a whole window per store update keeps writes infrequent.
pub struct Monitor<T> {
    receiver: PollingReceiver<T>,
    aggregator: ChannelAggregator,
    sink: Box<dyn SampleSink>,
    publishers: Vec<Box<dyn SnapshotPublisher>>,
}

impl<T: Transport> Monitor<T> {
    pub fn new(receiver: PollingReceiver<T>, sink: Box<dyn SampleSink>) -> Self {
        Self {
            receiver,
            aggregator: ChannelAggregator::default(),
            sink,
            publishers: Vec::new(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: ChannelAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Add a destination for the last packet of each window.
    pub fn with_publisher(mut self, publisher: Box<dyn SnapshotPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Signal that ends `run` after the current wait.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.receiver.shutdown_handle()
    }

    /// Run a single collection window.
    pub fn run_window(&mut self) -> Result<WindowSummary> {
        let packets = self.receiver.poll()?;
        let channels = self.aggregator.collect(&packets);

        let mut samples = 0usize;
        for (channel, series) in &channels {
            self.sink.append(channel, series)?;
            samples += series.len();
        }

        if let Some(latest) = packets.last() {
            for publisher in &mut self.publishers {
                publisher.publish(latest)?;
            }
        }

        let summary = WindowSummary {
            packets: packets.len(),
            samples,
        };
        info!(
            packets = summary.packets,
            samples = summary.samples,
            dropped_total = self.aggregator.dropped(),
            "window complete"
        );
        Ok(summary)
    }

    /// Run windows until shutdown is triggered, `max_windows` have completed,
    /// or an error escapes. Returns the number of windows completed.
    pub fn run(&mut self, max_windows: Option<usize>) -> Result<usize> {
        let shutdown = self.shutdown_handle();
        let mut completed = 0usize;
        while !shutdown.is_triggered() && max_windows.is_none_or(|max| completed < max) {
            self.run_window()?;
            completed += 1;
        }
        info!(windows = completed, "monitor stopped");
        Ok(completed)
    }

    pub fn receiver(&self) -> &PollingReceiver<T> {
        &self.receiver
    }

    pub fn aggregator(&self) -> &ChannelAggregator {
        &self.aggregator
    }
}
