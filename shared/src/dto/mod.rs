//! # Data Transfer Objects (DTOs)
//!
//! Wire structures exchanged between the relay client and the relay server.
//!
//! ## Module Organization
//!
//! - [`chat`] - Chat request payload and conversation turns
//! - [`frame`] - The relay's SSE frame envelope
//!
//! ## Serialization Format
//!
//! All DTOs use `serde_json`:
//!
//! - **Field naming**: snake_case (default serde behavior)
//! - **Optional fields**: Omitted when `None` using `#[serde(skip_serializing_if = "Option::is_none")]`
//! - **Enums**: Serialize to lowercase strings using `#[serde(rename_all = "lowercase")]`
//!
//! ## Example Exchange
//!
//! ```text
//! POST /api/chat
//! Content-Type: application/json
//!
//! {
//!   "message": "What projects have you built?",
//!   "conversation_history": [
//!     { "role": "user", "content": "Hi!" },
//!     { "role": "assistant", "content": "Hello, ask me anything." }
//!   ]
//! }
//! ```
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type: text/event-stream
//!
//! data: {"type":"delta","content":"I have built"}
//!
//! data: {"type":"delta","content":" three things."}
//!
//! data: {"type":"done","content":""}
//! ```

pub mod chat;
pub mod frame;

pub use chat::*;
pub use frame::*;
