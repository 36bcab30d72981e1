//! Delimiter-based stream framing.
//!
//! This is the core value-add layer of delimio. A sender frames each
//! message (or multipart item) with a sender-chosen delimiter line; the
//! receiver wraps the connection in a [`DelimitedStream`] that scans for
//! that delimiter and exposes the bytes before it as an ordinary
//! [`std::io::Read`]. No length prefixes, no payload escaping, no
//! whole-message buffering.
//!
//! Delimited streams nest: a [`DelimitedStream`] can be constructed over
//! another one, and any bytes the inner stream pulled past its own frame
//! boundary are handed back to the parent on close, so many logical
//! segments can share one physical connection.

pub mod error;
pub mod gen;
pub mod stream;

pub use error::{Result, StreamError};
pub use gen::{DebugDelimiterGen, DelimiterGen, RandomDelimiterGen};
pub use stream::{DelimitedStream, LINE_TERMINATOR};
