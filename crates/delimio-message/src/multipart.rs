use std::io::Read;

use delimio_stream::DelimitedStream;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{MessageError, Result};

/// What a multipart item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// An in-memory binary value.
    Binary,
    /// A file upload.
    File,
}

/// The descriptor line of a multipart item, one JSON object per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub name: String,
}

/// Sequential reader over the items of a multipart message body.
///
/// Each item is a nested delimited segment inside the outer body stream.
/// Items are strictly ordered: an item's segment is fully drained and its
/// overrun handed back to the body stream before the next item is opened,
/// so nothing is buffered beyond the scanner's own window.
pub struct MultipartReader<'a, S: Read> {
    body: &'a mut DelimitedStream<S>,
}

impl<'a, S: Read> MultipartReader<'a, S> {
    pub fn new(body: &'a mut DelimitedStream<S>) -> Self {
        Self { body }
    }

    /// Visit every item in order. The handler receives the item
    /// descriptor and a bounded stream over the item's content; any
    /// content the handler leaves unread is skipped.
    pub fn process<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(&ItemInfo, &mut DelimitedStream<&mut DelimitedStream<S>>) -> Result<()>,
    {
        loop {
            if self.body.is_end_of_stream() {
                break;
            }
            let mut item = DelimitedStream::new(&mut *self.body);
            if item.delimiter().is_none() {
                // No further item segment: the probe consumed the outer
                // message's trailing framing instead.
                let overrun = item.into_overrun();
                self.body.push_overrun(&overrun);
                break;
            }

            let info: ItemInfo = match item.read_line()? {
                Some(line) => serde_json::from_str(&line)?,
                None => return Err(MessageError::MissingDescriptor),
            };
            trace!(name = %info.name, kind = ?info.kind, "multipart item");

            handler(&info, &mut item)?;

            item.skip_to_end()?;
            let overrun = item.into_overrun();
            self.body.push_overrun(&overrun);
        }
        debug!("multipart body exhausted");
        Ok(())
    }
}
