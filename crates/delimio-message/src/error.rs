use delimio_stream::StreamError;

/// Errors that can occur while writing or reading message envelopes.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The header line is missing or does not start with a known type.
    #[error("malformed message header: {0:?}")]
    MalformedHeader(String),

    /// The message body does not have the type the caller asked for.
    #[error("wrong body type: expected {expected}, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },

    /// A multipart item descriptor line could not be parsed.
    #[error("invalid multipart item descriptor: {0}")]
    ItemDescriptor(#[from] serde_json::Error),

    /// A multipart item segment carried no descriptor line.
    #[error("multipart item segment without a descriptor line")]
    MissingDescriptor,

    /// An error from the underlying delimited stream.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// An I/O error on the transport.
    #[error("message I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MessageError>;
