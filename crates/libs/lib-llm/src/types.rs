//! # Upstream Wire Types
//!
//! OpenAI-style chat-completion request and streaming-chunk shapes.

use serde::{Deserialize, Serialize};

/// One message of the upstream conversation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

impl UpstreamMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completion request body, always sent with `stream: true` by the relay.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<UpstreamMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One upstream streaming chunk (`choices[].delta.content`).
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    pub delta: StreamDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamDelta {
    pub content: Option<String>,
}

/// A typed event extracted from the upstream byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// An incremental fragment of generated text.
    Delta(String),
    /// End of generation, from the `[DONE]` sentinel, a populated
    /// `finish_reason`, or stream EOF.
    Done,
}
