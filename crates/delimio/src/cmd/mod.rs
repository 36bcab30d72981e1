use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod announce;
pub mod find;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one framed message to a server.
    Send(SendArgs),
    /// Accept connections and print received messages.
    Listen(ListenArgs),
    /// Advertise a service for network discovery.
    Announce(AnnounceArgs),
    /// Locate a service on the local network.
    Find(FindArgs),
    /// Show version information.
    Version,
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Announce(args) => announce::run(args),
        Command::Find(args) => find::run(args, format),
        Command::Version => version::run(),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server address (host:port).
    pub addr: String,
    /// Message command.
    #[arg(long, short = 'c', default_value = "Message")]
    pub command: String,
    /// Text body.
    #[arg(long, conflicts_with_all = ["file", "filenames"])]
    pub text: Option<String>,
    /// Binary body read from a file.
    #[arg(long, conflicts_with_all = ["text", "filenames"])]
    pub file: Option<PathBuf>,
    /// Filename-list body (comma-separated).
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["text", "file"])]
    pub filenames: Option<Vec<String>>,
    /// Use the human-readable debug delimiter instead of a random one.
    #[arg(long)]
    pub debug_delimiter: bool,
    /// Maximum random delimiter length in bytes.
    #[arg(long, default_value_t = 64)]
    pub max_delimiter_len: usize,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (host:port).
    pub addr: String,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct AnnounceArgs {
    /// Service name to answer for.
    pub name: String,
    /// UDP port to listen on.
    #[arg(long, short = 'p')]
    pub port: u16,
    /// Advertised service port. Defaults to the discovery port.
    #[arg(long)]
    pub service_port: Option<u16>,
    /// Stop after this long (e.g. 30s). Runs until killed if omitted.
    #[arg(long)]
    pub duration: Option<String>,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Service name to look for.
    pub name: String,
    /// UDP port the service announces on.
    #[arg(long, short = 'p')]
    pub port: u16,
    /// How long to wait for an answer (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

/// Parse durations of the `500ms` / `5s` form.
pub fn parse_duration(text: &str) -> CliResult<Duration> {
    let parse = |digits: &str, unit: fn(u64) -> Duration| {
        digits
            .parse::<u64>()
            .map(unit)
            .map_err(|_| CliError::new(USAGE, format!("invalid duration: {text}")))
    };
    if let Some(digits) = text.strip_suffix("ms") {
        parse(digits, Duration::from_millis)
    } else if let Some(digits) = text.strip_suffix('s') {
        parse(digits, Duration::from_secs)
    } else {
        parse(text, Duration::from_secs)
    }
}
