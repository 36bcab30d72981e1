use std::io::Read;
use std::net::{TcpListener, TcpStream};

use delimio_message::{MessageType, ReceivedMessage};
use tracing::{debug, info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{io_error, message_error, CliResult, SUCCESS};
use crate::output::{print_message, MessageSummary, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener = TcpListener::bind(&args.addr).map_err(|err| io_error("bind failed", err))?;
    info!(addr = %args.addr, "listening");

    let mut received = 0usize;
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        debug!(%peer, "connection accepted");

        received += serve_connection(stream, &peer, format, args.count.map(|n| n - received))?;
        if let Some(count) = args.count {
            if received >= count {
                break;
            }
        }
    }
    Ok(SUCCESS)
}

/// Read messages from one connection until it closes or `limit` is hit.
fn serve_connection(
    mut stream: TcpStream,
    peer: &str,
    format: OutputFormat,
    limit: Option<usize>,
) -> CliResult<usize> {
    let mut handled = 0usize;
    let mut overrun = Vec::new();
    loop {
        if limit.is_some_and(|limit| handled >= limit) {
            return Ok(handled);
        }
        let message = match ReceivedMessage::receive_with_overrun(&mut stream, &overrun) {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(%peer, "connection closed");
                return Ok(handled);
            }
            Err(err) => {
                // One bad message ends the connection, not the server.
                warn!(%peer, err = %message_error("receive failed", err), "dropping connection");
                return Ok(handled);
            }
        };

        match summarize(message, peer) {
            Ok((summary, leftover)) => {
                print_message(&summary, format);
                overrun = leftover;
            }
            Err(err) => {
                warn!(%peer, err = %err, "dropping connection");
                return Ok(handled);
            }
        }
        handled += 1;
    }
}

/// Consume a message body and produce its summary plus the transport
/// overrun for the next message.
fn summarize(
    mut message: ReceivedMessage<&mut TcpStream>,
    peer: &str,
) -> CliResult<(MessageSummary, Vec<u8>)> {
    let command = message.command().to_string();
    let kind = message.msg_type().name();

    let mut body_size = 0usize;
    let mut preview = None;
    match message.msg_type() {
        MessageType::Text => {
            let text = message
                .read_text()
                .map_err(|err| message_error("reading text body", err))?;
            body_size = text.len();
            preview = text.lines().next().map(str::to_string);
        }
        MessageType::Filenames => {
            let names = message
                .read_filenames()
                .map_err(|err| message_error("reading filenames body", err))?;
            body_size = names.len();
            preview = names.first().cloned();
        }
        MessageType::Multipart => {
            let mut items = 0usize;
            message
                .multipart()
                .map_err(|err| message_error("reading multipart body", err))?
                .process(|_, contents| {
                    items += 1;
                    let mut scratch = [0u8; 8 * 1024];
                    while contents.read(&mut scratch)? > 0 {}
                    Ok(())
                })
                .map_err(|err| message_error("reading multipart body", err))?;
            body_size = items;
        }
        MessageType::Binary => {
            let data = message
                .read_binary()
                .map_err(|err| message_error("reading binary body", err))?;
            body_size = data.len();
        }
        MessageType::Status => {}
    }

    let (_, overrun) = message
        .into_parts()
        .map_err(|err| message_error("draining message", err))?;

    Ok((
        MessageSummary {
            peer: peer.to_string(),
            command,
            kind,
            body_size,
            preview,
        },
        overrun,
    ))
}
