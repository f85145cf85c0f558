//! # Upstream Completion Client
//!
//! Client for an OpenAI-compatible chat-completion API in streaming mode.
//!
//! The relay is a pure translator: this crate owns the upstream wire shape
//! (`{model, messages, stream: true}` requests, `data:`-prefixed SSE chunk
//! lines) and exposes it as a typed stream of [`UpstreamEvent`]s. The
//! relay's own client-facing frame shape lives in `shared` and is produced
//! elsewhere; nothing upstream-specific leaks past this crate.

pub mod client;
pub mod parse;
pub mod types;

pub use client::{CompletionBackend, EventStream, LlmClient, LlmConfig, LlmError};
pub use parse::parse_upstream_line;
pub use types::{CompletionRequest, UpstreamEvent, UpstreamMessage};
