use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tedrx_frame::Packet;

/// A named measurement series fed from one packet field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Series name handed to the store.
    pub name: &'static str,
    /// Packet field the series samples.
    pub field: &'static str,
}

/// Demand in kW and cost rate in $/h.
pub const DEFAULT_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec {
        name: "tedrx-kw",
        field: "KWNow",
    },
    ChannelSpec {
        name: "tedrx-d",
        field: "DlrNow",
    },
];

/// One point of a channel, at whole-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Unix seconds, rounded half up from the capture time.
    pub timestamp: i64,
    pub value: f64,
}

/// Sorts packets into per-channel samples.
///
/// The store only keeps one point per second, so a sample landing on the
/// same second as the last accepted one for its channel is dropped. That
/// bookkeeping lives here and carries over between calls.
#[derive(Debug, Clone)]
pub struct ChannelAggregator {
    channels: &'static [ChannelSpec],
    last_accepted: HashMap<&'static str, i64>,
    dropped: u64,
}

impl Default for ChannelAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNELS)
    }
}

impl ChannelAggregator {
    pub fn new(channels: &'static [ChannelSpec]) -> Self {
        Self {
            channels,
            last_accepted: HashMap::new(),
            dropped: 0,
        }
    }

    /// Turn a batch of packets into ordered samples per channel.
    ///
    /// Channels whose field is missing from a packet are skipped for that
    /// packet. Only channels with at least one accepted sample appear.
    pub fn collect(&mut self, packets: &[Packet]) -> BTreeMap<&'static str, Vec<Sample>> {
        let mut out: BTreeMap<&'static str, Vec<Sample>> = BTreeMap::new();
        for packet in packets {
            let timestamp = whole_second(packet.timestamp());
            for channel in self.channels {
                let Some(value) = packet.get(channel.field) else {
                    continue;
                };
                if self.last_accepted.get(channel.name) == Some(&timestamp) {
                    self.dropped += 1;
                    continue;
                }
                self.last_accepted.insert(channel.name, timestamp);
                out.entry(channel.name)
                    .or_default()
                    .push(Sample { timestamp, value });
            }
        }
        out
    }

    /// Last second accepted for a channel, if any.
    pub fn last_accepted(&self, channel: &str) -> Option<i64> {
        self.last_accepted.get(channel).copied()
    }

    /// Samples dropped as same-second duplicates since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn channels(&self) -> &'static [ChannelSpec] {
        self.channels
    }
}

fn whole_second(timestamp: f64) -> i64 {
    (timestamp + 0.5).floor() as i64
}
