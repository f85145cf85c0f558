//! # Relay Frame Envelope
//!
//! The relay speaks its own SSE frame shape to the client, decoupled from
//! whatever the upstream completion provider emits. Each SSE event carries
//! one JSON-encoded [`RelayFrame`]:
//!
//! ```text
//! data: {"type":"delta","content":"partial text"}
//! data: {"type":"done","content":""}
//! data: {"type":"error","content":"human-readable message"}
//! ```
//!
//! A literal `data: [DONE]` line is an alternate termination sentinel that
//! clients must also recognize.

use serde::{Deserialize, Serialize};

/// Termination sentinel emitted outside the JSON-payload channel.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Frame discriminant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Delta,
    Done,
    Error,
}

/// One frame of the relay's SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub content: String,
}

impl RelayFrame {
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Delta,
            content: content.into(),
        }
    }

    pub fn done() -> Self {
        Self {
            kind: FrameKind::Done,
            content: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Error,
            content: message.into(),
        }
    }

    /// Parse the JSON payload of one SSE event.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
