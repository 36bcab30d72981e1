use std::io::Read;

use delimio_stream::DelimitedStream;
use tracing::trace;

use crate::error::{MessageError, Result};
use crate::header::{MessageHeader, MessageType};
use crate::multipart::MultipartReader;

/// An inbound message: parsed header plus the delimited body stream.
///
/// The body is consumed through the typed readers or directly via
/// [`body`](Self::body); either way it ends exactly at the message's
/// closing delimiter line, leaving the transport positioned for the next
/// message (retrievable through [`into_parts`](Self::into_parts)).
#[derive(Debug)]
pub struct ReceivedMessage<S: Read> {
    header: MessageHeader,
    stream: DelimitedStream<S>,
}

impl<S: Read> ReceivedMessage<S> {
    /// Read the framing and header of the next message from a transport.
    ///
    /// Returns `Ok(None)` when the transport is already closed or
    /// exhausted — probing a possibly-dead connection is not an error.
    pub fn receive(source: S) -> Result<Option<Self>> {
        Self::receive_with_overrun(source, &[])
    }

    /// Like [`receive`](Self::receive), with bytes left over from a
    /// previous message on the same transport.
    pub fn receive_with_overrun(source: S, overrun: &[u8]) -> Result<Option<Self>> {
        let mut stream = DelimitedStream::with_overrun(source, overrun)?;
        if stream.delimiter().is_none() {
            return Ok(None);
        }
        let header = match stream.read_line()? {
            Some(line) => MessageHeader::parse(&line)?,
            None => return Ok(None),
        };
        trace!(command = %header.command, kind = header.msg_type.name(), "message received");
        Ok(Some(Self { header, stream }))
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn command(&self) -> &str {
        &self.header.command
    }

    pub fn msg_type(&self) -> MessageType {
        self.header.msg_type
    }

    /// Streaming access to the message body.
    pub fn body(&mut self) -> &mut DelimitedStream<S> {
        &mut self.stream
    }

    /// Read a text body to completion.
    pub fn read_text(&mut self) -> Result<String> {
        self.expect_type(MessageType::Text)?;
        let mut text = String::new();
        self.stream.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Read a binary body to completion.
    pub fn read_binary(&mut self) -> Result<Vec<u8>> {
        self.expect_type(MessageType::Binary)?;
        let mut data = Vec::new();
        self.stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a filename-list body to completion, one name per line.
    pub fn read_filenames(&mut self) -> Result<Vec<String>> {
        self.expect_type(MessageType::Filenames)?;
        let mut names = Vec::new();
        while let Some(line) = self.stream.read_line()? {
            names.push(line);
        }
        Ok(names)
    }

    /// Iterate the items of a multipart body.
    pub fn multipart(&mut self) -> Result<MultipartReader<'_, S>> {
        self.expect_type(MessageType::Multipart)?;
        Ok(MultipartReader::new(&mut self.stream))
    }

    fn expect_type(&self, expected: MessageType) -> Result<()> {
        if self.header.msg_type != expected {
            return Err(MessageError::WrongType {
                expected: expected.name(),
                actual: self.header.msg_type.name(),
            });
        }
        Ok(())
    }

    /// Drain whatever body remains and close, returning the transport
    /// and any bytes over-read past this message's frame.
    pub fn into_parts(mut self) -> Result<(S, Vec<u8>)> {
        self.stream.skip_to_end()?;
        Ok(self.stream.into_parts())
    }
}
