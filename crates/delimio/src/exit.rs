use std::fmt;
use std::io;

use delimio_discover::DiscoverError;
use delimio_message::MessageError;
use delimio_stream::StreamError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::AddrInUse => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::Io(source) => io_error(context, source),
        other @ StreamError::OverrunTooLarge { .. } => {
            CliError::new(INTERNAL, format!("{context}: {other}"))
        }
    }
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    match err {
        MessageError::Io(source) => io_error(context, source),
        MessageError::Stream(err) => stream_error(context, err),
        MessageError::MalformedHeader(_)
        | MessageError::ItemDescriptor(_)
        | MessageError::MissingDescriptor
        | MessageError::WrongType { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn discover_error(context: &str, err: DiscoverError) -> CliError {
    match err {
        DiscoverError::Io(source) => io_error(context, source),
        DiscoverError::Bind { source, .. } => io_error(context, source),
    }
}
