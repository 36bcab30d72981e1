//! Message envelope layer over delimiter-framed streams.
//!
//! A message on the wire is one delimited segment: the delimiter line,
//! a header line (`<type char><command>`), the body, then the delimiter
//! again on its own line. Bodies are typed: text, binary, a filename
//! list, or a multipart item list where every item is its own nested
//! delimited segment carried inside the message body.
//!
//! The framing itself lives in `delimio-stream`; this crate is the
//! encode/decode glue on top of it.

pub mod error;
pub mod header;
pub mod multipart;
pub mod recv;
pub mod send;

pub use error::{MessageError, Result};
pub use header::{MessageHeader, MessageType};
pub use multipart::{ItemInfo, ItemKind, MultipartReader};
pub use recv::ReceivedMessage;
pub use send::{Body, Item, SendMessage};
