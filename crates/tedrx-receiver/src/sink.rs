use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::channels::Sample;
use crate::error::Result;

/// Destination for per-channel samples (the time-series store boundary).
///
/// Samples arrive already de-duplicated and in capture order.
pub trait SampleSink {
    fn append(&mut self, channel: &str, samples: &[Sample]) -> Result<()>;
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn append(&mut self, channel: &str, samples: &[Sample]) -> Result<()> {
        (**self).append(channel, samples)
    }
}

#[derive(Serialize)]
struct SampleRecord<'a> {
    channel: &'a str,
    timestamp: i64,
    value: f64,
}

/// Writes one JSON object per sample, newline-delimited.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SampleSink for JsonLinesSink<W> {
    fn append(&mut self, channel: &str, samples: &[Sample]) -> Result<()> {
        for sample in samples {
            let record = SampleRecord {
                channel,
                timestamp: sample.timestamp,
                value: sample.value,
            };
            serde_json::to_writer(&mut self.out, &record)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every sample in memory, keyed by channel.
#[derive(Debug, Default)]
pub struct MemorySink {
    series: BTreeMap<String, Vec<Sample>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&self, channel: &str) -> &[Sample] {
        self.series.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

impl SampleSink for MemorySink {
    fn append(&mut self, channel: &str, samples: &[Sample]) -> Result<()> {
        self.series
            .entry(channel.to_string())
            .or_default()
            .extend_from_slice(samples);
        Ok(())
    }
}
