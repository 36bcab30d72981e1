/// Errors that can occur while constructing or composing delimited streams.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A prepared overrun does not fit in the internal read buffer.
    ///
    /// This indicates a logic error in the composing layer, not a
    /// transient condition.
    #[error("overrun too large ({size} bytes, buffer capacity {capacity})")]
    OverrunTooLarge { size: usize, capacity: usize },

    /// An I/O error occurred on the underlying byte source.
    #[error("delimited stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;
