//! # Frame Decoder
//!
//! Incremental decoder turning raw relay SSE bytes into a sequence of
//! [`ClientEvent`]s. Pure state machine: feed it chunks split at arbitrary
//! byte boundaries and it reconstructs the same logical event sequence it
//! would produce for a single chunk.
//!
//! Decoding rules:
//!
//! - the buffer holds raw bytes and splits on `\n` before any UTF-8
//!   decoding, so a chunk boundary inside a multibyte character cannot
//!   corrupt it; an incomplete trailing line waits for the next chunk
//! - `:`-prefixed lines are SSE comments (keep-alives) and are ignored
//! - each `data:` payload is either the literal `[DONE]` sentinel or a
//!   JSON [`RelayFrame`]
//! - a payload that fails to parse but starts with `{` or `[` is treated
//!   as truncated JSON: it is re-buffered and merged with the next payload
//!   instead of being discarded
//! - the terminal state is sticky: after one done/error event the decoder
//!   ignores everything else, so a `[DONE]` sentinel followed by a
//!   structured done frame (or a stream close) still yields exactly one
//!   terminal event

use shared::dto::{FrameKind, RelayFrame, DONE_SENTINEL};

/// One decoded event, mirroring the three client callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Incremental relay-frame decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Raw bytes not yet terminated by a newline
    buffer: Vec<u8>,
    /// Payload that looked like truncated JSON, awaiting its continuation
    pending: String,
    terminal: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a done or error event has been produced.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Feed one chunk of the response body; returns all events it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        if self.terminal {
            return events;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            // A complete line holds only whole characters; UTF-8
            // continuation bytes never equal `\n`.
            let line = String::from_utf8_lossy(&line[..pos]);
            self.process_line(&line, &mut events);
            if self.terminal {
                break;
            }
        }

        events
    }

    /// Signal end of stream.
    ///
    /// A close without an explicit terminal frame counts as completion, so
    /// the caller's terminal callback still fires exactly once.
    pub fn finish(&mut self) -> Option<ClientEvent> {
        if self.terminal {
            return None;
        }

        // Flush a final unterminated line, if any.
        let tail = std::mem::take(&mut self.buffer);
        let tail = String::from_utf8_lossy(&tail);
        let mut events = Vec::new();
        if !tail.trim().is_empty() {
            self.process_line(&tail, &mut events);
        }
        if let Some(event) = events.into_iter().next() {
            if matches!(event, ClientEvent::Done | ClientEvent::Error(_)) {
                return Some(event);
            }
            // A trailing unterminated delta is dropped; the relay always
            // newline-terminates delta frames.
        }

        self.terminal = true;
        Some(ClientEvent::Done)
    }

    fn process_line(&mut self, raw: &str, events: &mut Vec<ClientEvent>) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        // SSE comment lines (keep-alives) carry no payload and must never
        // reach a pending truncated-JSON merge.
        if line.starts_with(':') {
            return;
        }

        let payload = line
            .strip_prefix("data: ")
            .or_else(|| line.strip_prefix("data:"))
            .unwrap_or(line)
            .trim();

        // The sentinel arrives on its own line, never as a JSON continuation.
        if payload == DONE_SENTINEL {
            self.pending.clear();
            self.terminal = true;
            events.push(ClientEvent::Done);
            return;
        }

        let candidate = if self.pending.is_empty() {
            payload.to_string()
        } else {
            format!("{}{}", self.pending, payload)
        };

        match RelayFrame::parse(&candidate) {
            Ok(frame) => {
                self.pending.clear();
                match frame.kind {
                    FrameKind::Delta => events.push(ClientEvent::Delta(frame.content)),
                    FrameKind::Done => {
                        self.terminal = true;
                        events.push(ClientEvent::Done);
                    }
                    FrameKind::Error => {
                        self.terminal = true;
                        events.push(ClientEvent::Error(frame.content));
                    }
                }
            }
            Err(_) if candidate.starts_with('{') || candidate.starts_with('[') => {
                // Truncated JSON; merge with the next payload.
                self.pending = candidate;
            }
            Err(err) => {
                self.pending.clear();
                tracing::debug!(error = %err, "Dropping unparseable relay line");
            }
        }
    }
}
