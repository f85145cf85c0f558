//! # Core Library
//!
//! Configuration, error handling, database pool, and repositories for the
//! portfolio chat relay.

pub mod config;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use model::store::{create_pool, DbPool};
