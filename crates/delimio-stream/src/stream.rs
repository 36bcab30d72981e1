use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use tracing::{debug, trace};

use crate::error::{Result, StreamError};

/// The line terminator byte that delimiter lines end with.
pub const LINE_TERMINATOR: u8 = b'\n';

const BUFFER_SIZE: usize = 8 * 1024;

/// Delimiter-matching state. A candidate line is collected from the first
/// terminator byte onward; `matched` counts delimiter bytes matched so
/// far (the leading terminator is part of `candidate` but not counted).
enum ScanState {
    Idle,
    Matching { candidate: Vec<u8>, matched: usize },
}

/// A bounded, read-only view over a byte source that ends at a
/// recognized delimiter line.
///
/// The delimiter is learned from the stream itself during construction:
/// blank leading lines are skipped and the first non-empty line becomes
/// the matching target. Reading then yields payload bytes only, stopping
/// permanently once a line exactly starting with the delimiter is seen.
/// Content after the delimiter on that line is discarded, which lets the
/// sender pad the closing line.
///
/// The source may itself be another `DelimitedStream` (multipart
/// framing). Because this stream pulls from its source in blocks, it can
/// over-read past its own frame boundary; [`take_overrun`] /
/// [`into_overrun`] return those bytes so the composing layer can feed
/// them back to the parent via [`push_overrun`].
///
/// Not safe for concurrent reads: the scanner is stateful per byte and
/// has no internal locking. Nested streams must be consumed strictly
/// sequentially.
///
/// [`take_overrun`]: DelimitedStream::take_overrun
/// [`into_overrun`]: DelimitedStream::into_overrun
/// [`push_overrun`]: DelimitedStream::push_overrun
pub struct DelimitedStream<S> {
    source: S,
    delimiter: Option<Vec<u8>>,
    /// End of the logical stream: delimiter matched or source exhausted.
    /// Monotonic. Buffered pushback may still be deliverable after this
    /// flips.
    ended: bool,
    state: ScanState,
    /// Bytes speculatively consumed while testing a delimiter match,
    /// returned for ordinary delivery after a failed candidate.
    match_pushback: VecDeque<u8>,
    /// Bytes handed back from an inner nested stream. Replayed verbatim
    /// before anything else and never rescanned.
    handoff_pushback: VecDeque<u8>,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
}

impl<S: Read> DelimitedStream<S> {
    /// Wrap a byte source and learn the delimiter from its leading lines.
    ///
    /// If the source ends or fails before a non-empty line is found, the
    /// stream comes up empty (no delimiter, already at end) rather than
    /// erroring. Callers can use this to probe a possibly-closed
    /// connection.
    pub fn new(source: S) -> Self {
        let mut stream = Self::bare(source);
        stream.discover_delimiter();
        stream
    }

    /// Like [`new`](Self::new), but with bytes already pulled from the
    /// source by a previous stream (its overrun) prepended to the read
    /// buffer.
    ///
    /// Fails with [`StreamError::OverrunTooLarge`] if the overrun exceeds
    /// the internal buffer capacity; that is a logic error in the
    /// composing layer.
    pub fn with_overrun(source: S, overrun: &[u8]) -> Result<Self> {
        if overrun.len() > BUFFER_SIZE {
            return Err(StreamError::OverrunTooLarge {
                size: overrun.len(),
                capacity: BUFFER_SIZE,
            });
        }
        let mut stream = Self::bare(source);
        stream.buf[..overrun.len()].copy_from_slice(overrun);
        stream.filled = overrun.len();
        stream.discover_delimiter();
        Ok(stream)
    }

    fn bare(source: S) -> Self {
        Self {
            source,
            delimiter: None,
            ended: false,
            state: ScanState::Idle,
            match_pushback: VecDeque::new(),
            handoff_pushback: VecDeque::new(),
            buf: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
        }
    }

    /// Skip blank lines and take the first non-empty line as the
    /// delimiter. Transport failure here means "no delimiter": the
    /// stream is marked ended and reads simply return nothing.
    fn discover_delimiter(&mut self) {
        loop {
            match self.read_source_line() {
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => {
                    trace!(len = line.len(), "delimiter learned");
                    self.delimiter = Some(line);
                    return;
                }
                Ok(None) => {
                    self.ended = true;
                    return;
                }
                Err(err) => {
                    debug!(%err, "source failed during delimiter discovery");
                    self.ended = true;
                    return;
                }
            }
        }
    }

    /// Read one raw line from the combined buffer, bypassing delimiter
    /// scanning. Trailing carriage returns are stripped. Returns `None`
    /// at source end with nothing accumulated.
    fn read_source_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        loop {
            match self.next_byte()? {
                Some(LINE_TERMINATOR) => break,
                Some(byte) => line.push(byte),
                None => {
                    self.ended = true;
                    if line.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
            }
        }
        while line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Pull the next byte: match pushback first, otherwise the block
    /// buffer, refilling from the source when the buffer is spent.
    fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        if let Some(byte) = self.match_pushback.pop_front() {
            return Ok(Some(byte));
        }
        if self.pos >= self.filled {
            self.pos = 0;
            self.filled = loop {
                match self.source.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            };
            if self.filled == 0 {
                return Ok(None);
            }
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    /// Return a failed candidate to the front of the logical stream for
    /// ordinary delivery.
    fn requeue(&mut self, candidate: Vec<u8>) {
        self.match_pushback.clear();
        self.match_pushback.extend(candidate);
    }

    /// Read and drop the remainder of the delimiter line.
    fn discard_line_remainder(&mut self) -> std::io::Result<()> {
        loop {
            match self.next_byte()? {
                None | Some(LINE_TERMINATOR) => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// The delimiter this stream matches against, if one was learned.
    pub fn delimiter(&self) -> Option<&[u8]> {
        self.delimiter.as_deref()
    }

    /// True once the delimiter has been matched (or the source
    /// exhausted) and no buffered pushback remains deliverable.
    pub fn is_end_of_stream(&self) -> bool {
        self.ended && self.match_pushback.is_empty() && self.handoff_pushback.is_empty()
    }

    /// Read one line of payload through the scanning read path, stripping
    /// trailing carriage returns. Returns `None` once the stream ends
    /// with nothing accumulated.
    pub fn read_line(&mut self) -> std::io::Result<Option<String>> {
        if self.is_end_of_stream() {
            return Ok(None);
        }
        let mut line = Vec::new();
        let mut saw_terminator = false;
        loop {
            let mut byte = [0u8; 1];
            if self.read(&mut byte)? == 0 {
                break;
            }
            if byte[0] == LINE_TERMINATOR {
                saw_terminator = true;
                break;
            }
            line.push(byte[0]);
        }
        if !saw_terminator && line.is_empty() {
            return Ok(None);
        }
        while line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Drain the remaining payload without inspecting it.
    pub fn skip_to_end(&mut self) -> std::io::Result<()> {
        let mut scratch = [0u8; BUFFER_SIZE];
        while self.read(&mut scratch)? > 0 {}
        Ok(())
    }

    /// Return, and clear, everything pulled from the source but not
    /// delivered as payload nor consumed by this stream's own framing:
    /// handed-off bytes from inner streams plus the unread tail of the
    /// block buffer. Meaningful once this stream has reached its end.
    pub fn take_overrun(&mut self) -> Vec<u8> {
        let mut overrun: Vec<u8> = std::mem::take(&mut self.handoff_pushback).into();
        overrun.extend_from_slice(&self.buf[self.pos..self.filled]);
        self.pos = self.filled;
        overrun
    }

    /// Prepend bytes handed back by an inner stream; they are replayed
    /// verbatim before any new pull from the source.
    pub fn push_overrun(&mut self, overrun: &[u8]) {
        for &byte in overrun.iter().rev() {
            self.handoff_pushback.push_front(byte);
        }
    }

    /// Close this stream, returning its overrun. The caller is
    /// responsible for feeding it into the parent stream's
    /// [`push_overrun`](Self::push_overrun) when composing nested
    /// streams.
    pub fn into_overrun(mut self) -> Vec<u8> {
        self.take_overrun()
    }

    /// Close this stream, returning the source and the overrun.
    pub fn into_parts(mut self) -> (S, Vec<u8>) {
        let overrun = self.take_overrun();
        (self.source, overrun)
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }
}

impl<S: Read> Read for DelimitedStream<S> {
    /// Single-pass scan, constant extra memory bounded by the delimiter
    /// length. `Ok(0)` is the end-of-stream signal, not an error.
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        if self.is_end_of_stream() {
            return Ok(0);
        }

        let mut written = 0;

        // Handed-off bytes were over-read from the shared source by an
        // inner stream and logically belong here; replay them verbatim.
        while written < out.len() {
            match self.handoff_pushback.pop_front() {
                Some(byte) => {
                    out[written] = byte;
                    written += 1;
                }
                None => break,
            }
        }

        while written < out.len() && !self.ended {
            let byte = match self.next_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    self.ended = true;
                    debug!("source exhausted before delimiter");
                    break;
                }
                // Err after delivering bytes would violate the Read
                // contract; return what we have and let the source
                // error resurface on the next call.
                Err(_) if written > 0 => break,
                Err(err) => return Err(err),
            };
            // Whether more pushback remains to replay. Bytes re-consumed
            // from pushback are delivered as-is; only the last one (queue
            // now empty) re-enters terminator classification.
            let replaying = !self.match_pushback.is_empty();

            if byte == LINE_TERMINATOR && !replaying {
                match std::mem::replace(&mut self.state, ScanState::Idle) {
                    ScanState::Idle => {
                        // Possibly at the start of the delimiter line.
                        self.state = ScanState::Matching {
                            candidate: vec![LINE_TERMINATOR],
                            matched: 0,
                        };
                    }
                    ScanState::Matching { mut candidate, .. } => {
                        // Either two terminators in a row (a literal
                        // blank line in the payload) or the line ended
                        // without completing the match. Both replay the
                        // candidate as ordinary content.
                        candidate.push(LINE_TERMINATOR);
                        self.requeue(candidate);
                    }
                }
                continue;
            }

            match std::mem::replace(&mut self.state, ScanState::Idle) {
                ScanState::Matching {
                    mut candidate,
                    matched,
                } => {
                    candidate.push(byte);
                    let expected = self
                        .delimiter
                        .as_deref()
                        .and_then(|delim| delim.get(matched).copied());
                    if expected == Some(byte) {
                        let matched = matched + 1;
                        let delim_len = self.delimiter.as_deref().map_or(0, <[u8]>::len);
                        if matched == delim_len {
                            // Delimiter confirmed. Drop the rest of its
                            // line and close the stream for reading.
                            self.ended = true;
                            self.match_pushback.clear();
                            if let Err(err) = self.discard_line_remainder() {
                                if written == 0 {
                                    return Err(err);
                                }
                                debug!(%err, "source failed discarding delimiter line");
                            }
                            trace!(delivered = written, "delimiter matched");
                        } else {
                            self.state = ScanState::Matching { candidate, matched };
                        }
                    } else {
                        self.requeue(candidate);
                    }
                }
                ScanState::Idle => {
                    out[written] = byte;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

impl<S> std::fmt::Debug for DelimitedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedStream")
            .field("delimiter_len", &self.delimiter.as_ref().map(Vec::len))
            .field("ended", &self.ended)
            .field("buffered", &(self.filled - self.pos))
            .field("match_pushback", &self.match_pushback.len())
            .field("handoff_pushback", &self.handoff_pushback.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::{thread_rng, Rng, RngCore};

    use super::*;
    use crate::gen::{DelimiterGen, RandomDelimiterGen};

    /// Frame a payload the way a sender does: delimiter line, payload,
    /// then the delimiter again on its own line.
    fn frame(delim: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut wire = Vec::new();
        wire.extend_from_slice(delim);
        wire.push(LINE_TERMINATOR);
        wire.extend_from_slice(payload);
        wire.push(LINE_TERMINATOR);
        wire.extend_from_slice(delim);
        wire.push(LINE_TERMINATOR);
        wire
    }

    fn scan_all(wire: Vec<u8>) -> Vec<u8> {
        let mut stream = DelimitedStream::new(Cursor::new(wire));
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        payload
    }

    #[test]
    fn roundtrip_with_random_delimiter() {
        let delim = RandomDelimiterGen::default().make_delimiter();
        let payload = b"abcdefg\r\nxyz";
        assert_eq!(scan_all(frame(&delim, payload)), payload);
    }

    #[test]
    fn roundtrip_preserves_embedded_blank_lines() {
        let delim = b"====end====";
        let payload = b"first\n\n\nlast";
        assert_eq!(scan_all(frame(delim, payload)), payload);
    }

    #[test]
    fn roundtrip_payload_ending_in_crlf() {
        let delim = b"boundary-123";
        let payload = b"content line\r\n";
        assert_eq!(scan_all(frame(delim, payload)), payload);
    }

    #[test]
    fn roundtrip_large_binary_ending_in_crlf() {
        // 10 MB of random bytes ending in \r\n, read back byte for byte.
        let mut payload = vec![0u8; 10 * 1024 * 1024];
        thread_rng().fill_bytes(&mut payload);
        let len = payload.len();
        payload[len - 2] = b'\r';
        payload[len - 1] = b'\n';

        let delim = RandomDelimiterGen::default().make_delimiter();
        assert_eq!(scan_all(frame(&delim, &payload)), payload);
    }

    #[test]
    fn delimiter_choice_does_not_change_payload() {
        let payload = b"the same bytes\neither way\r\n";
        let short = scan_all(frame(b"x", payload));
        let long = scan_all(frame(&RandomDelimiterGen::default().make_delimiter(), payload));
        assert_eq!(short, payload);
        assert_eq!(long, payload);
    }

    #[test]
    fn leading_blank_lines_before_delimiter_are_skipped() {
        let mut wire = vec![LINE_TERMINATOR; 3];
        wire.extend(frame(b"delim", b"payload"));
        let mut stream = DelimitedStream::new(Cursor::new(wire));
        assert_eq!(stream.delimiter(), Some(b"delim".as_ref()));
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn content_after_closing_delimiter_is_discarded() {
        let wire = b"delim\npayload\ndelim extra padding\n".to_vec();
        assert_eq!(scan_all(wire), b"payload");
    }

    #[test]
    fn delimiter_mid_line_is_not_matched() {
        let delim = b"END";
        let payload = b"xEND\nnot at line start";
        assert_eq!(scan_all(frame(delim, payload)), payload);
    }

    #[test]
    fn partial_delimiter_prefix_is_replayed() {
        let delim = b"ENDOFSTREAM";
        let payload = b"line\nENDOF but not quite\nmore";
        assert_eq!(scan_all(frame(delim, payload)), payload);
    }

    #[test]
    fn blank_line_immediately_before_delimiter() {
        // An empty payload line right before the real delimiter line must
        // not confuse the matcher.
        let delim = b"delim";
        let payload = b"content\n";
        assert_eq!(scan_all(frame(delim, payload)), payload);
    }

    #[test]
    fn empty_payload() {
        let delim = b"delim";
        assert_eq!(scan_all(frame(delim, b"")), b"");
    }

    #[test]
    fn empty_source_comes_up_ended() {
        let mut stream = DelimitedStream::new(Cursor::new(Vec::<u8>::new()));
        assert!(stream.delimiter().is_none());
        assert!(stream.is_end_of_stream());
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn source_failure_during_discovery_comes_up_ended() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::ConnectionReset))
            }
        }

        let mut stream = DelimitedStream::new(FailingReader);
        assert!(stream.delimiter().is_none());
        assert!(stream.is_end_of_stream());
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn source_without_closing_delimiter_ends_at_exhaustion() {
        let wire = b"delim\ntruncated payload".to_vec();
        assert_eq!(scan_all(wire), b"truncated payload");
    }

    #[test]
    fn end_signal_is_idempotent() {
        let mut stream = DelimitedStream::new(Cursor::new(frame(b"delim", b"abc")));
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        assert!(stream.is_end_of_stream());
        let mut buf = [0u8; 16];
        for _ in 0..5 {
            assert_eq!(stream.read(&mut buf).unwrap(), 0);
        }
    }

    #[test]
    fn one_byte_output_reads_keep_candidate_state() {
        // A candidate in progress must survive read() calls whose output
        // buffer fills mid-candidate.
        let delim = b"DELIMITER";
        let payload = b"a\nDELIMxyz\nb";
        let mut stream = DelimitedStream::new(Cursor::new(frame(delim, payload)));
        let mut collected = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            if stream.read(&mut byte).unwrap() == 0 {
                break;
            }
            collected.push(byte[0]);
        }
        assert_eq!(collected, payload);
    }

    #[test]
    fn byte_by_byte_source_reads() {
        struct ByteByByteReader {
            bytes: Vec<u8>,
            pos: usize,
        }
        impl Read for ByteByByteReader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.pos >= self.bytes.len() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.bytes[self.pos];
                self.pos += 1;
                Ok(1)
            }
        }

        let payload = b"partial reads\r\nfrom the transport\n\nare fine";
        let source = ByteByByteReader {
            bytes: frame(b"chunky-delim", payload),
            pos: 0,
        };
        let mut stream = DelimitedStream::new(source);
        let mut collected = Vec::new();
        stream.read_to_end(&mut collected).unwrap();
        assert_eq!(collected, payload);
    }

    #[test]
    fn interrupted_source_read_retries() {
        struct InterruptedThenData {
            interrupted: bool,
            bytes: Vec<u8>,
            pos: usize,
        }
        impl Read for InterruptedThenData {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                let n = (self.bytes.len() - self.pos).min(buf.len());
                buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            }
        }

        let source = InterruptedThenData {
            interrupted: false,
            bytes: frame(b"delim", b"payload"),
            pos: 0,
        };
        let mut stream = DelimitedStream::new(source);
        let mut collected = Vec::new();
        stream.read_to_end(&mut collected).unwrap();
        assert_eq!(collected, b"payload");
    }

    #[test]
    fn transport_failure_during_payload_read_surfaces() {
        struct HeaderThenFail {
            sent: bool,
        }
        impl Read for HeaderThenFail {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.sent {
                    return Err(std::io::Error::from(ErrorKind::ConnectionReset));
                }
                self.sent = true;
                let header = b"delim\npartial";
                buf[..header.len()].copy_from_slice(header);
                Ok(header.len())
            }
        }

        let mut stream = DelimitedStream::new(HeaderThenFail { sent: false });
        assert_eq!(stream.delimiter(), Some(b"delim".as_ref()));
        let mut collected = Vec::new();
        let err = stream.read_to_end(&mut collected).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
        assert_eq!(collected, b"partial");
    }

    #[test]
    fn read_line_strips_carriage_return_and_signals_end() {
        let payload = b"first line\r\nsecond\n\nlast";
        let mut stream = DelimitedStream::new(Cursor::new(frame(b"delim", payload)));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("first line"));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(stream.read_line().unwrap(), None);
        assert_eq!(stream.read_line().unwrap(), None);
    }

    #[test]
    fn skip_to_end_drains_payload() {
        let mut stream = DelimitedStream::new(Cursor::new(frame(b"delim", b"unwanted bytes")));
        stream.skip_to_end().unwrap();
        assert!(stream.is_end_of_stream());
    }

    #[test]
    fn no_byte_lost_or_duplicated_across_frame_boundary() {
        // Everything past this stream's frame must come back as overrun.
        let mut wire = frame(b"delim", b"payload");
        let trailing = b"bytes that belong to the next logical stream";
        wire.extend_from_slice(trailing);

        let mut stream = DelimitedStream::new(Cursor::new(wire));
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"payload");

        let overrun = stream.take_overrun();
        assert_eq!(overrun, trailing);
        // A second take finds nothing: the first call cleared it.
        assert!(stream.take_overrun().is_empty());
    }

    #[test]
    fn sequential_frames_resume_via_overrun() {
        let mut wire = frame(b"first-delim", b"first payload");
        wire.extend(frame(b"second-delim", b"second payload"));

        let mut first = DelimitedStream::new(Cursor::new(wire));
        let mut payload = Vec::new();
        first.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"first payload");

        let (source, overrun) = first.into_parts();
        let mut second = DelimitedStream::with_overrun(source, &overrun).unwrap();
        assert_eq!(second.delimiter(), Some(b"second-delim".as_ref()));
        payload.clear();
        second.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"second payload");
    }

    #[test]
    fn nested_sub_segments_share_one_source() {
        // Ten framed sub-segments of random sizes, some ending in \r\n,
        // nested inside one outer stream; each read and closed in order.
        let mut rng = thread_rng();
        let mut gen = RandomDelimiterGen::default();
        let parts: Vec<Vec<u8>> = (0..10)
            .map(|i| {
                let mut part = vec![0u8; rng.gen_range(1..64 * 1024)];
                rng.fill_bytes(&mut part);
                if i % 2 == 0 {
                    part.extend_from_slice(b"\r\n");
                }
                part
            })
            .collect();

        let mut body = Vec::new();
        for part in &parts {
            body.extend(frame(&gen.make_delimiter(), part));
        }
        let outer_delim = gen.make_delimiter();
        let wire = frame(&outer_delim, &body);

        let mut outer = DelimitedStream::new(Cursor::new(wire));
        for part in &parts {
            let mut inner = DelimitedStream::new(&mut outer);
            let mut collected = Vec::new();
            inner.read_to_end(&mut collected).unwrap();
            assert_eq!(&collected, part);
            let overrun = inner.into_overrun();
            outer.push_overrun(&overrun);
        }
        outer.skip_to_end().unwrap();
        assert!(outer.is_end_of_stream());
    }

    #[test]
    fn handoff_pushback_is_replayed_before_the_source() {
        let mut stream = DelimitedStream::new(Cursor::new(frame(b"delim", b"tail")));
        stream.push_overrun(b"head ");
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"head tail");
    }

    #[test]
    fn pushed_overrun_prepends_before_existing_handoff() {
        let mut stream = DelimitedStream::new(Cursor::new(frame(b"delim", b"")));
        stream.push_overrun(b"later");
        stream.push_overrun(b"sooner ");
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"sooner later");
    }

    #[test]
    fn oversized_overrun_is_rejected() {
        let overrun = vec![0u8; BUFFER_SIZE + 1];
        let err = DelimitedStream::with_overrun(Cursor::new(Vec::new()), &overrun).unwrap_err();
        assert!(matches!(err, StreamError::OverrunTooLarge { .. }));
    }

    #[test]
    fn construction_from_overrun_alone() {
        let wire = frame(b"delim", b"entirely from overrun");
        let mut stream = DelimitedStream::with_overrun(Cursor::new(Vec::new()), &wire).unwrap();
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"entirely from overrun");
    }
}
