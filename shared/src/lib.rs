//! # Shared Types
//!
//! Wire types shared between the relay server and the relay client.

pub mod dto;

pub use dto::*;
