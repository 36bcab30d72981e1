use crate::error::{MessageError, Result};

/// The body encoding of a message, carried as the first character of the
/// header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// UTF-8 text body.
    Text,
    /// Raw binary body.
    Binary,
    /// One filename per line.
    Filenames,
    /// A sequence of nested delimited item segments.
    Multipart,
    /// A short status/command message with no meaningful body.
    Status,
}

impl MessageType {
    pub fn tag(self) -> char {
        match self {
            MessageType::Text => 'T',
            MessageType::Binary => 'B',
            MessageType::Filenames => 'F',
            MessageType::Multipart => 'M',
            MessageType::Status => 'S',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'T' => Some(MessageType::Text),
            'B' => Some(MessageType::Binary),
            'F' => Some(MessageType::Filenames),
            'M' => Some(MessageType::Multipart),
            'S' => Some(MessageType::Status),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Binary => "binary",
            MessageType::Filenames => "filenames",
            MessageType::Multipart => "multipart",
            MessageType::Status => "status",
        }
    }
}

/// The parsed header line of a received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub msg_type: MessageType,
    pub command: String,
}

impl MessageHeader {
    /// Parse a header line: type character followed by the command.
    pub fn parse(line: &str) -> Result<Self> {
        let mut chars = line.chars();
        let tag = chars
            .next()
            .ok_or_else(|| MessageError::MalformedHeader(line.to_string()))?;
        let msg_type = MessageType::from_tag(tag)
            .ok_or_else(|| MessageError::MalformedHeader(line.to_string()))?;
        Ok(Self {
            msg_type,
            command: chars.collect(),
        })
    }

    /// Render the header line (without terminator).
    pub fn render(&self) -> String {
        format!("{}{}", self.msg_type.tag(), self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_roundtrip() {
        let header = MessageHeader {
            msg_type: MessageType::Text,
            command: "GetStatus".to_string(),
        };
        let parsed = MessageHeader::parse(&header.render()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn parse_empty_command() {
        let header = MessageHeader::parse("S").unwrap();
        assert_eq!(header.msg_type, MessageType::Status);
        assert_eq!(header.command, "");
    }

    #[test]
    fn rejects_unknown_type_tag() {
        let err = MessageHeader::parse("Zcmd").unwrap_err();
        assert!(matches!(err, MessageError::MalformedHeader(_)));
    }

    #[test]
    fn rejects_empty_line() {
        let err = MessageHeader::parse("").unwrap_err();
        assert!(matches!(err, MessageError::MalformedHeader(_)));
    }

    #[test]
    fn all_tags_roundtrip() {
        for msg_type in [
            MessageType::Text,
            MessageType::Binary,
            MessageType::Filenames,
            MessageType::Multipart,
            MessageType::Status,
        ] {
            assert_eq!(MessageType::from_tag(msg_type.tag()), Some(msg_type));
        }
    }
}
