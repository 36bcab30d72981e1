use std::io::Write;
use std::path::PathBuf;

use bytes::Bytes;
use delimio_stream::{DelimiterGen, LINE_TERMINATOR};
use tracing::trace;

use crate::error::Result;
use crate::header::{MessageHeader, MessageType};
use crate::multipart::{ItemInfo, ItemKind};

/// The typed body of an outbound message.
pub enum Body {
    Text(String),
    Binary(Bytes),
    /// One filename per line on the wire.
    Filenames(Vec<String>),
    /// Each item becomes its own nested delimited segment.
    Multipart(Vec<Item>),
    /// Command only, empty body.
    Status,
}

/// One item of a multipart body.
pub enum Item {
    Binary { name: String, data: Bytes },
    /// Content is read from the file at send time.
    File { name: String, path: PathBuf },
}

/// An outbound message: command header plus typed body, framed with a
/// freshly generated delimiter when written.
pub struct SendMessage {
    pub command: String,
    pub body: Body,
}

impl SendMessage {
    pub fn new(command: impl Into<String>, body: Body) -> Self {
        Self {
            command: command.into(),
            body,
        }
    }

    pub fn text(command: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(command, Body::Text(text.into()))
    }

    pub fn binary(command: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(command, Body::Binary(data.into()))
    }

    pub fn filenames(command: impl Into<String>, names: Vec<String>) -> Self {
        Self::new(command, Body::Filenames(names))
    }

    pub fn multipart(command: impl Into<String>, items: Vec<Item>) -> Self {
        Self::new(command, Body::Multipart(items))
    }

    pub fn msg_type(&self) -> MessageType {
        match self.body {
            Body::Text(_) => MessageType::Text,
            Body::Binary(_) => MessageType::Binary,
            Body::Filenames(_) => MessageType::Filenames,
            Body::Multipart(_) => MessageType::Multipart,
            Body::Status => MessageType::Status,
        }
    }

    /// Frame and write the whole message: delimiter line, header line,
    /// body, closing delimiter line. The separating terminator before the
    /// closing line is always written, so payloads that already end in
    /// one round-trip exactly.
    pub fn write_to<W: Write>(&self, out: &mut W, gen: &mut dyn DelimiterGen) -> Result<()> {
        let delim = gen.make_delimiter();
        let header = MessageHeader {
            msg_type: self.msg_type(),
            command: self.command.clone(),
        };

        out.write_all(&delim)?;
        out.write_all(&[LINE_TERMINATOR])?;
        out.write_all(header.render().as_bytes())?;
        out.write_all(&[LINE_TERMINATOR])?;

        match &self.body {
            Body::Text(text) => out.write_all(text.as_bytes())?,
            Body::Binary(data) => out.write_all(data)?,
            Body::Filenames(names) => {
                for name in names {
                    out.write_all(name.as_bytes())?;
                    out.write_all(&[LINE_TERMINATOR])?;
                }
            }
            Body::Multipart(items) => {
                for item in items {
                    write_item(out, item, gen)?;
                }
            }
            Body::Status => {}
        }

        out.write_all(&[LINE_TERMINATOR])?;
        out.write_all(&delim)?;
        out.write_all(&[LINE_TERMINATOR])?;
        out.flush()?;
        trace!(command = %self.command, kind = self.msg_type().name(), "message written");
        Ok(())
    }
}

fn write_item<W: Write>(out: &mut W, item: &Item, gen: &mut dyn DelimiterGen) -> Result<()> {
    let delim = gen.make_delimiter();
    let info = match item {
        Item::Binary { name, .. } => ItemInfo {
            kind: ItemKind::Binary,
            name: name.clone(),
        },
        Item::File { name, .. } => ItemInfo {
            kind: ItemKind::File,
            name: name.clone(),
        },
    };

    out.write_all(&delim)?;
    out.write_all(&[LINE_TERMINATOR])?;
    out.write_all(serde_json::to_string(&info)?.as_bytes())?;
    out.write_all(&[LINE_TERMINATOR])?;

    match item {
        Item::Binary { data, .. } => out.write_all(data)?,
        Item::File { path, .. } => {
            let mut file = std::fs::File::open(path)?;
            std::io::copy(&mut file, out)?;
        }
    }

    out.write_all(&[LINE_TERMINATOR])?;
    out.write_all(&delim)?;
    out.write_all(&[LINE_TERMINATOR])?;
    Ok(())
}
