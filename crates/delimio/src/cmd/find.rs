use delimio_discover::find_service;

use crate::cmd::{parse_duration, FindArgs};
use crate::exit::{discover_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_service, OutputFormat};

pub fn run(args: FindArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let location = find_service(&args.name, args.port, timeout)
        .map_err(|err| discover_error("discovery probe failed", err))?
        .ok_or_else(|| CliError::new(FAILURE, format!("no answer for service {}", args.name)))?;

    print_service(&args.name, &location, format);
    Ok(SUCCESS)
}
