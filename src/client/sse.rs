//! Parsing core for the line-oriented pseudo-event stream.
//!
//! Each meaningful line is `data: <json>` and the stream ends with a line
//! whose payload contains `[DONE]` (any case). The rules live here once;
//! both the push and pull interpreters in `client` are thin adapters.

use super::wire::ChatResponse;

const DATA_MARKER: &str = "data:";
const DONE_SENTINEL: &str = "[done]";

/// What one line of the stream means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Termination sentinel; normal end of stream.
    Done,
    /// Blank line, keep-alive, or an undecodable/contentless event.
    Skip,
    /// The line's non-empty content fragments, joined in choice order.
    Content(String),
}

/// Classify one line. Decode failures are logged and downgraded to `Skip`;
/// the stream must keep going.
pub fn classify_line(raw: &str) -> LineEvent {
    let item = raw.strip_prefix(DATA_MARKER).unwrap_or(raw).trim();

    if item.is_empty() {
        return LineEvent::Skip;
    }
    if item.to_ascii_lowercase().contains(DONE_SENTINEL) {
        return LineEvent::Done;
    }

    let envelope: ChatResponse = match serde_json::from_str(item) {
        Ok(e) => e,
        Err(err) => {
            tracing::warn!(fragment = item, error = %err, "failed to decode ChatResponse stream event");
            return LineEvent::Skip;
        }
    };

    let content = envelope.joined_content();
    if content.is_empty() {
        LineEvent::Skip
    } else {
        LineEvent::Content(content)
    }
}

/// Splits network chunks into complete lines across chunk boundaries.
///
/// Tolerates CRLF and emits the trailing unterminated line on `finish`.
#[derive(Debug, Default)]
pub struct LineScanner {
    buf: Vec<u8>,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = memchr::memchr(b'\n', &self.buf) {
            let mut line = self.buf.drain(..=pos).collect::<Vec<u8>>();
            if line.ends_with(&[b'\n']) {
                line.pop();
            }
            if line.ends_with(&[b'\r']) {
                line.pop();
            }
            out.push(decode_line(&line));
        }

        out
    }

    /// Drain whatever is left after the last newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        Some(decode_line(&line))
    }
}

fn decode_line(line: &[u8]) -> String {
    match std::str::from_utf8(line) {
        Ok(s) => s.to_string(),
        Err(err) => {
            tracing::warn!(error = %err, "stream line is not valid UTF-8; using lossy decode");
            String::from_utf8_lossy(line).into_owned()
        }
    }
}

// memchr is tiny and speeds up newline search; keep it internal to this module.
mod memchr {
    pub fn memchr(needle: u8, haystack: &[u8]) -> Option<usize> {
        haystack.iter().position(|&b| b == needle)
    }
}
