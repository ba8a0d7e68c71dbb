//! Streaming response support
//!
//! Reassembles `data: <payload>` frames separated by a blank line out of a
//! chunked response body and turns each payload into a [`StreamEvent`].

use crate::types::StreamEvent;
use crate::Result;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Producer's end-of-stream payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// Tag every frame's payload line starts with
pub const DATA_PREFIX: &str = "data:";

const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Longest payload excerpt written to logs
const LOG_EXCERPT_CHARS: usize = 120;

/// Decoded events of one response body
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// Result of decoding a single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Well-formed JSON payload
    Event(StreamEvent),
    /// The `[DONE]` sentinel
    Done,
    /// No data line, or a payload that is not a JSON object
    Skipped,
}

/// Incremental frame reassembler
///
/// Buffers raw bytes so that frames and multi-byte characters split across
/// chunk boundaries are put back together before decoding.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Offset up to which `buffer` is known not to contain a delimiter
    scanned: usize,
    skipped: u64,
    done_seen: bool,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the events of every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(pos) = find_delimiter(&self.buffer[self.scanned.max(start)..]) {
            let end = self.scanned.max(start) + pos;
            match parse_frame(&self.buffer[start..end]) {
                Frame::Event(event) => events.push(event),
                Frame::Done => self.done_seen = true,
                Frame::Skipped => self.skipped += 1,
            }
            start = end + FRAME_DELIMITER.len();
            self.scanned = start;
        }

        self.buffer.drain(..start);
        // A delimiter may straddle the next chunk boundary, so re-check the last byte.
        self.scanned = self.buffer.len().saturating_sub(FRAME_DELIMITER.len() - 1);
        events
    }

    /// Bytes held back waiting for a frame delimiter
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Frames dropped so far because they could not be decoded
    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }

    /// Whether the producer's `[DONE]` sentinel has been seen
    pub fn done_seen(&self) -> bool {
        self.done_seen
    }

    /// End of input; an unterminated trailing frame is dropped
    ///
    /// Returns the number of bytes discarded.
    pub fn finish(self) -> usize {
        let leftover = self.buffer.len();
        if leftover > 0 {
            debug!(
                bytes = leftover,
                "discarding incomplete frame at end of stream"
            );
        }
        if self.skipped > 0 {
            debug!(skipped = self.skipped, "stream finished with skipped frames");
        }
        leftover
    }
}

fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)
}

/// Decode one frame, without its trailing delimiter
pub fn parse_frame(raw: &[u8]) -> Frame {
    let text = String::from_utf8_lossy(raw);

    let mut data_lines: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        match line.strip_prefix(DATA_PREFIX) {
            Some(rest) => data_lines.push(rest.strip_prefix(' ').unwrap_or(rest)),
            None => debug!(line = %excerpt(line), "ignoring non-data line in frame"),
        }
    }

    if data_lines.is_empty() {
        if !text.trim().is_empty() {
            debug!(frame = %excerpt(&text), "skipping frame without data line");
        }
        return Frame::Skipped;
    }

    let payload = data_lines.join("\n");
    if payload.trim() == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<StreamEvent>(&payload) {
        Ok(event) => Frame::Event(event),
        Err(e) => {
            warn!(error = %e, payload = %excerpt(&payload), "skipping malformed frame");
            Frame::Skipped
        }
    }
}

fn excerpt(s: &str) -> String {
    if s.chars().count() <= LOG_EXCERPT_CHARS {
        s.to_string()
    } else {
        let head: String = s.chars().take(LOG_EXCERPT_CHARS).collect();
        format!("{}...", head)
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: Option<FrameDecoder>,
    pending: VecDeque<StreamEvent>,
}

/// Lazily decode a response body into events
///
/// The returned stream ends when `bytes` ends. A transport error is passed
/// through as an `Err` item and terminates the stream.
pub fn decode_stream<S>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: Some(FrameDecoder::new()),
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                return Some((Ok(event), st));
            }
            if st.decoder.is_none() {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    if let Some(decoder) = st.decoder.as_mut() {
                        st.pending.extend(decoder.push(&chunk));
                    }
                }
                Some(Err(e)) => {
                    st.decoder = None;
                    return Some((Err(e), st));
                }
                None => {
                    if let Some(decoder) = st.decoder.take() {
                        decoder.finish();
                    }
                }
            }
        }
    })
    .boxed()
}
