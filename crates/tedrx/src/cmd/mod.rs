use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use tedrx_transport::DEFAULT_BAUD_RATE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod fields;
pub mod monitor;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the RDU and emit per-channel samples and snapshots.
    Monitor(MonitorArgs),
    /// Decode packets from a raw capture file.
    Decode(DecodeArgs),
    /// Write a synthetic RDU byte stream.
    Simulate(SimulateArgs),
    /// Print the packet field table.
    Fields(FieldsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Simulate(args) => simulate::run(args),
        Command::Fields(args) => fields::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port the RDU is attached to.
    #[arg(env = "TEDRX_PORT", required_unless_present = "replay")]
    pub port: Option<String>,
    /// Replay a raw capture file instead of opening a port.
    #[arg(long, value_name = "FILE", conflicts_with = "port")]
    pub replay: Option<PathBuf>,
    /// Bytes handed out per read when replaying.
    #[arg(long, default_value = "64")]
    pub chunk: usize,
    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Length of one collection window (e.g. 60s, 500ms).
    #[arg(long, default_value = "60s", value_parser = parse_duration)]
    pub window: Duration,
    /// Wait between packet requests.
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub interval: Duration,
    /// Stop after N windows. Default: run until interrupted.
    #[arg(long)]
    pub windows: Option<usize>,
    /// Log and drop malformed frames instead of exiting.
    #[arg(long)]
    pub skip_bad_frames: bool,
    /// Append samples as JSON lines to this file. Default: stdout.
    #[arg(long, value_name = "FILE")]
    pub samples: Option<PathBuf>,
    /// Write a DashboardData XML snapshot after each window.
    #[arg(long, value_name = "FILE", env = "TEDRX_SNAPSHOT")]
    pub xml: Option<PathBuf>,
    /// Write a JSON snapshot after each window.
    #[arg(long, value_name = "FILE")]
    pub json_snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to read, or `-` for stdin.
    pub path: PathBuf,
    /// Log and drop malformed frames instead of exiting.
    #[arg(long)]
    pub skip_bad_frames: bool,
    /// Stop after N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Output file, or `-` for stdout.
    pub path: PathBuf,
    /// Number of packets to write.
    #[arg(long, short = 'n', default_value = "10")]
    pub count: usize,
    /// KWNow of the first packet.
    #[arg(long, default_value = "1.5")]
    pub kw: f64,
    /// KWNow increment per packet.
    #[arg(long, default_value = "0")]
    pub step: f64,
    /// DlrNow for every packet.
    #[arg(long, default_value = "0.18")]
    pub dollars: f64,
    /// Line voltage for every packet.
    #[arg(long, default_value = "120")]
    pub volts: f64,
    /// Interleave stray bytes between packets.
    #[arg(long)]
    pub noise: bool,
}

#[derive(Args, Debug, Default)]
pub struct FieldsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        "m" => Duration::from_secs(
            value
                .checked_mul(60)
                .ok_or_else(|| format!("duration too large: {input}"))?,
        ),
        _ => Duration::from_secs(value),
    })
}
