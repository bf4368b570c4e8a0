use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tedrx_frame::{decode, FrameError, FrameReader, PROTOCOL_TABLE};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(&args.path)?;
    let mut decoded = 0usize;
    let mut skipped = 0usize;

    for frame in FrameReader::new(input) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) if args.skip_bad_frames && !matches!(err, FrameError::Io(_)) => {
                tracing::warn!(error = %err, "skipping malformed input");
                skipped += 1;
                continue;
            }
            Err(err) => return Err(frame_error("read failed", err)),
        };

        match decode(&frame.payload, PROTOCOL_TABLE) {
            Ok(packet) => {
                print_packet(&packet, format);
                decoded += 1;
            }
            Err(err) if args.skip_bad_frames => {
                tracing::warn!(error = %err, "skipping undecodable frame");
                skipped += 1;
            }
            Err(err) => return Err(frame_error("decode failed", err)),
        }

        if args.count.is_some_and(|count| decoded >= count) {
            break;
        }
    }

    tracing::info!(decoded, skipped, "capture decoded");
    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
    Ok(Box::new(file))
}
