use tedrx_frame::PROTOCOL_TABLE;

use crate::cmd::FieldsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_fields, OutputFormat};

pub fn run(_args: FieldsArgs, format: OutputFormat) -> CliResult<i32> {
    print_fields(PROTOCOL_TABLE, format);
    Ok(SUCCESS)
}
