//! # Streaming Completion Client
//!
//! `LlmClient` performs the actual HTTP call against an OpenAI-compatible
//! provider. The [`CompletionBackend`] trait is the seam the relay handler
//! depends on, so the upstream can be scripted in tests.

use crate::parse::parse_upstream_line;
use crate::types::{CompletionRequest, UpstreamEvent, UpstreamMessage};
use async_stream::try_stream;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use thiserror::Error;

/// Errors from the upstream completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider rejected the request before any streaming began.
    #[error("upstream returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, TLS, read).
    #[error("upstream http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A pinned, boxed stream of upstream events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<UpstreamEvent, LlmError>> + Send>>;

/// Capability the relay handler depends on: open one streaming completion.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Start a streaming chat completion for the given messages.
    ///
    /// Pre-stream rejection surfaces as `Err`; mid-stream failures surface
    /// as `Err` items inside the returned stream.
    async fn stream_chat(&self, messages: Vec<UpstreamMessage>) -> Result<EventStream, LlmError>;
}

/// Connection settings for the upstream provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Reqwest-backed client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for LlmClient {
    async fn stream_chat(&self, messages: Vec<UpstreamMessage>) -> Result<EventStream, LlmError> {
        let body = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            stream: true,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(model = %self.config.model, "Opening upstream completion stream");

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Upstream rejected completion request");
            return Err(LlmError::Api { status, message });
        }

        let mut bytes = resp.bytes_stream();

        let stream = try_stream! {
            // Buffer raw bytes and split on `\n` before decoding, so a
            // chunk boundary inside a multibyte character stays intact.
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line[..pos]);

                    match parse_upstream_line(&line) {
                        Some(UpstreamEvent::Delta(text)) => yield UpstreamEvent::Delta(text),
                        Some(UpstreamEvent::Done) => {
                            yield UpstreamEvent::Done;
                            return;
                        }
                        None => {}
                    }
                }
            }

            // Provider closed without a sentinel; treat EOF as completion.
            let tail = String::from_utf8_lossy(&buffer);
            if let Some(event) = parse_upstream_line(&tail) {
                if let UpstreamEvent::Delta(text) = event {
                    yield UpstreamEvent::Delta(text);
                }
            }
            yield UpstreamEvent::Done;
        };

        Ok(Box::pin(stream))
    }
}
