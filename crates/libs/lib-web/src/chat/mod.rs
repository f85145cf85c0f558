//! # Chat Relay
//!
//! The relay's core: classify the incoming message into content topics,
//! assemble a bounded textual context, forward a streaming completion
//! request upstream, and re-frame the upstream stream for the client.
//!
//! ## Modules
//!
//! - **[`classifier`]**: keyword-gated topic selection
//! - **[`context`]**: labeled-block context assembly under a character budget
//! - **[`handler`]**: the `POST /api/chat` SSE handler

// region: --- Modules
pub mod classifier;
pub mod context;
pub mod handler;
// endregion: --- Modules

// region: --- Re-exports
pub use classifier::{Classifier, KeywordClassifier, Topic};
pub use context::{system_prompt, AssembledContext, ContextBuilder};
pub use handler::handle_chat;
// endregion: --- Re-exports
