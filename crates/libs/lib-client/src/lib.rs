//! # Relay Stream Consumer
//!
//! Client side of the chat relay: sends one user message plus bounded
//! conversation history to the relay endpoint, consumes the streamed
//! response frame by frame, and reveals text incrementally through three
//! callbacks (`on_delta`, `on_done`, `on_error`).
//!
//! Layering:
//!
//! - [`decoder::FrameDecoder`] - pure incremental byte-to-event state
//!   machine, independently testable without a network
//! - [`client::RelayClient`] - the HTTP call wrapped around the decoder,
//!   with status mapping, a wall-clock timeout, and the empty-reply guard
//! - [`session`] - explicit conversation state with injected storage,
//!   instead of module-global session memory

pub mod client;
pub mod decoder;
pub mod session;

pub use client::{map_status_message, RelayClient};
pub use decoder::{ClientEvent, FrameDecoder};
pub use session::{ConversationState, InMemorySessionStore, SessionStore};
