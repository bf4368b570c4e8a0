use tedrx_frame::PACKET_LEN;
use tedrx_transport::DEFAULT_BAUD_RATE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("tedrx {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: tedrx");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("TEDRX_BUILD_TARGET"));
    println!("profile: {}", env!("TEDRX_BUILD_PROFILE"));
    println!("packet_len: {PACKET_LEN}");
    println!("baud_rate: {DEFAULT_BAUD_RATE}");
    println!(
        "features: receiver={}, async={}, cli=true",
        cfg!(feature = "receiver"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
