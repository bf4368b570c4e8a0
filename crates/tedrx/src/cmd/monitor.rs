use std::fs::{self, OpenOptions};
use std::io::BufWriter;

use tedrx_receiver::{
    DashboardXml, ErrorPolicy, JsonLinesSink, JsonSnapshot, Monitor, PollingReceiver,
    ReceiverConfig, SampleSink, Shutdown,
};
use tedrx_transport::{MemoryTransport, SerialConfig, SerialTransport, Transport};

use crate::cmd::MonitorArgs;
use crate::exit::{io_error, receiver_error, transport_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: MonitorArgs) -> CliResult<i32> {
    let transport = open_transport(&args)?;

    let config = ReceiverConfig {
        window: args.window,
        poll_interval: args.interval,
        error_policy: if args.skip_bad_frames {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        },
        ..ReceiverConfig::default()
    };

    let shutdown = Shutdown::new();
    install_ctrlc_handler(shutdown.clone())?;

    let receiver = PollingReceiver::with_config(transport, config).with_shutdown(shutdown);
    let mut monitor = Monitor::new(receiver, open_sink(&args)?);
    if let Some(path) = &args.xml {
        monitor = monitor.with_publisher(Box::new(DashboardXml::new(path)));
    }
    if let Some(path) = &args.json_snapshot {
        monitor = monitor.with_publisher(Box::new(JsonSnapshot::new(path)));
    }

    let windows = monitor
        .run(args.windows)
        .map_err(|err| receiver_error("receive failed", err))?;
    tracing::info!(windows, "monitor finished");

    Ok(SUCCESS)
}

fn open_transport(args: &MonitorArgs) -> CliResult<Box<dyn Transport>> {
    if let Some(path) = &args.replay {
        let capture = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        tracing::info!(path = %path.display(), bytes = capture.len(), "replaying capture");
        return Ok(Box::new(MemoryTransport::from_stream(capture, args.chunk)));
    }

    let port = args
        .port
        .as_deref()
        .ok_or_else(|| CliError::new(USAGE, "a serial port or --replay is required"))?;
    let config = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    let transport = SerialTransport::open_with_config(port, &config)
        .map_err(|err| transport_error("open failed", err))?;
    Ok(Box::new(transport))
}

fn open_sink(args: &MonitorArgs) -> CliResult<Box<dyn SampleSink>> {
    match &args.samples {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(JsonLinesSink::new(BufWriter::new(file))))
        }
        None => Ok(Box::new(JsonLinesSink::new(std::io::stdout()))),
    }
}

fn install_ctrlc_handler(shutdown: Shutdown) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.trigger()).map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
