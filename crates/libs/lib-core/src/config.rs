//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.

use lib_utils::envs::{get_env, get_env_or, get_env_parse_or};

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// API key for the upstream chat-completion provider
    pub llm_api_key: String,

    /// Base URL of the upstream provider (OpenAI-compatible)
    pub llm_base_url: String,

    /// Model name sent with every completion request
    pub llm_model: String,

    /// Maximum completion length in tokens
    pub llm_max_tokens: u32,

    /// Sampling temperature for the completion request
    pub llm_temperature: f32,

    /// Hard character budget for assembled prompt context
    ///
    /// Bounds prompt cost and latency; the assembled context is truncated
    /// to this many characters before it is spliced into the system prompt.
    pub context_char_budget: usize,

    /// How many rows each matched content bucket contributes
    pub context_slice_size: i64,

    /// How many trailing conversation turns the server keeps from the
    /// client-supplied history
    pub history_max_turns: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = get_env_or("DATABASE_URL", "sqlite:data/portfolio.db");

        let llm_api_key =
            get_env("LLM_API_KEY").map_err(|_| "LLM_API_KEY must be set in environment")?;

        let llm_base_url = get_env_or("LLM_BASE_URL", "https://api.openai.com/v1");
        let llm_model = get_env_or("LLM_MODEL", "gpt-4o-mini");

        let llm_max_tokens = get_env_parse_or("LLM_MAX_TOKENS", 500u32)
            .map_err(|e| format!("LLM_MAX_TOKENS must be a valid number: {}", e))?;

        let llm_temperature = get_env_parse_or("LLM_TEMPERATURE", 0.7f32)
            .map_err(|e| format!("LLM_TEMPERATURE must be a valid number: {}", e))?;

        let context_char_budget = get_env_parse_or("CONTEXT_CHAR_BUDGET", 4000usize)
            .map_err(|e| format!("CONTEXT_CHAR_BUDGET must be a valid number: {}", e))?;

        let context_slice_size = get_env_parse_or("CONTEXT_SLICE_SIZE", 5i64)
            .map_err(|e| format!("CONTEXT_SLICE_SIZE must be a valid number: {}", e))?;

        let history_max_turns = get_env_parse_or("HISTORY_MAX_TURNS", 10usize)
            .map_err(|e| format!("HISTORY_MAX_TURNS must be a valid number: {}", e))?;

        Ok(Self {
            database_url,
            llm_api_key,
            llm_base_url,
            llm_model,
            llm_max_tokens,
            llm_temperature,
            context_char_budget,
            context_slice_size,
            history_max_turns,
        })
    }

    /// Validate configuration values against operational limits.
    pub fn validate(&self) -> Result<(), String> {
        if self.llm_api_key.trim().is_empty() {
            return Err("LLM_API_KEY must not be empty".to_string());
        }

        if self.llm_max_tokens < 1 || self.llm_max_tokens > 4096 {
            return Err("LLM_MAX_TOKENS must be between 1 and 4096".to_string());
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err("LLM_TEMPERATURE must be between 0.0 and 2.0".to_string());
        }

        if self.context_char_budget < 500 || self.context_char_budget > 16_000 {
            return Err("CONTEXT_CHAR_BUDGET must be between 500 and 16000".to_string());
        }

        if self.context_slice_size < 1 || self.context_slice_size > 10 {
            return Err("CONTEXT_SLICE_SIZE must be between 1 and 10".to_string());
        }

        if self.history_max_turns < 1 || self.history_max_turns > 50 {
            return Err("HISTORY_MAX_TURNS must be between 1 and 50".to_string());
        }

        Ok(())
    }
}
