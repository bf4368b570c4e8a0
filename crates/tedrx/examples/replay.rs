//! Replay a synthetic RDU stream through the polling receiver.
//!
//! Run with: cargo run --example replay

use std::time::Duration;

use tedrx::frame::{FrameWriter, PayloadBuilder};
use tedrx::receiver::{ChannelAggregator, PollingReceiver, ReceiverConfig};
use tedrx::transport::MemoryTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = FrameWriter::new(Vec::new());
    for kw in [0.85, 1.10, 2.40] {
        let payload = PayloadBuilder::new()
            .set("KWNow", kw)?
            .set("DlrNow", kw * 0.12)?
            .build();
        writer.send(&payload)?;
    }
    let stream = writer.into_inner();

    // Small chunks so frames straddle reads, as they do on a real port.
    let transport = MemoryTransport::from_stream(stream, 50);
    let config = ReceiverConfig {
        window: Duration::from_millis(300),
        poll_interval: Duration::from_millis(5),
        ..ReceiverConfig::default()
    };
    let mut receiver = PollingReceiver::with_config(transport, config);

    let packets = receiver.poll()?;
    println!("decoded {} packets", packets.len());

    let mut aggregator = ChannelAggregator::default();
    for (channel, samples) in aggregator.collect(&packets) {
        for sample in samples {
            println!("{channel} {} {:.2}", sample.timestamp, sample.value);
        }
    }
    Ok(())
}
