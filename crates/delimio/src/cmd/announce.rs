use delimio_discover::DiscoverServer;
use tracing::info;

use crate::cmd::{parse_duration, AnnounceArgs};
use crate::exit::{discover_error, CliResult, SUCCESS};

pub fn run(args: AnnounceArgs) -> CliResult<i32> {
    let service_port = args.service_port.unwrap_or(args.port);
    let server = DiscoverServer::start_advertising(args.port, &args.name, service_port)
        .map_err(|err| discover_error("starting discovery server", err))?;
    info!(name = %args.name, port = args.port, service_port, "announcing");

    match &args.duration {
        Some(text) => {
            std::thread::sleep(parse_duration(text)?);
            server.shutdown();
        }
        None => loop {
            std::thread::park();
        },
    }
    Ok(SUCCESS)
}
