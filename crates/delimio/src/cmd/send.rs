use std::net::TcpStream;

use bytes::Bytes;
use delimio_message::SendMessage;
use delimio_stream::{DebugDelimiterGen, DelimiterGen, RandomDelimiterGen};
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{io_error, message_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let message = build_message(&args)?;

    let mut stream =
        TcpStream::connect(&args.addr).map_err(|err| io_error("connect failed", err))?;
    info!(addr = %args.addr, command = %message.command, "sending message");

    let mut debug_gen = DebugDelimiterGen;
    let mut random_gen = RandomDelimiterGen::new(args.max_delimiter_len);
    let gen: &mut dyn DelimiterGen = if args.debug_delimiter {
        &mut debug_gen
    } else {
        &mut random_gen
    };

    message
        .write_to(&mut stream, gen)
        .map_err(|err| message_error("send failed", err))?;
    Ok(SUCCESS)
}

fn build_message(args: &SendArgs) -> CliResult<SendMessage> {
    if let Some(text) = &args.text {
        return Ok(SendMessage::text(&args.command, text.clone()));
    }
    if let Some(path) = &args.file {
        let data = std::fs::read(path).map_err(|err| io_error("reading payload file", err))?;
        return Ok(SendMessage::binary(&args.command, Bytes::from(data)));
    }
    if let Some(names) = &args.filenames {
        return Ok(SendMessage::filenames(&args.command, names.clone()));
    }
    // No body argument: send a bare status message.
    Ok(SendMessage::new(
        &args.command,
        delimio_message::Body::Status,
    ))
}
