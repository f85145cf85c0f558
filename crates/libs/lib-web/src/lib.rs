//! # Web Library
//!
//! HTTP server, chat relay handler, context assembly, and middleware.

pub mod chat;
pub mod middleware;
pub mod server;

pub use server::{start_server, AppState, ServerConfig};
