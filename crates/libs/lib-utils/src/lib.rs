//! # Utilities Library
//!
//! Shared utility functions for environment variables, text budgets, and validation.

pub mod envs;
pub mod text;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_or, get_env_parse_or};
pub use text::truncate_chars;
pub use validation::validate_not_empty;
