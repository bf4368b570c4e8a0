use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bytes::Bytes;
use tedrx_frame::{FrameWriter, PayloadBuilder, PACKET_REQUEST};

use crate::cmd::SimulateArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let mut writer = FrameWriter::new(open_output(&args.path)?);

    for i in 0..args.count {
        let payload = build_payload(&args, i)?;
        if args.noise {
            // Echoed request bytes and idle-line zeros between packets.
            writer
                .send_raw(&[PACKET_REQUEST, 0x00])
                .map_err(|err| frame_error("write failed", err))?;
        }
        writer
            .send(&payload)
            .map_err(|err| frame_error("write failed", err))?;
    }
    writer
        .flush()
        .map_err(|err| frame_error("write failed", err))?;

    tracing::info!(packets = args.count, "synthetic stream written");
    Ok(SUCCESS)
}

fn build_payload(args: &SimulateArgs, index: usize) -> CliResult<Bytes> {
    let kw = args.kw + args.step * index as f64;
    let payload = PayloadBuilder::new()
        .set("KWNow", kw)
        .and_then(|b| b.set("DlrNow", args.dollars))
        .and_then(|b| b.set("VrmsNowDsp", args.volts))
        .map_err(|err| frame_error("invalid packet values", err))?
        .build();
    Ok(payload)
}

fn open_output(path: &Path) -> CliResult<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path)
        .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
    Ok(Box::new(BufWriter::new(file)))
}
