//! # Database Models
//!
//! Row types for the portfolio content tables and the conversation log.
//!
//! The content tables are read-only from the relay's point of view: they
//! are written by the portfolio's own publishing tooling and only ever
//! fetched as "most recent N rows" slices during context assembly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A portfolio project entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Comma-separated technology list as authored, e.g. "Rust, axum, sqlite"
    pub tech_stack: String,
    pub link: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A skill entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Self-assessed proficiency, 1-100
    pub proficiency: i64,
    pub created_at: NaiveDateTime,
}

/// A work-experience entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Experience {
    pub id: i64,
    pub company: String,
    pub role: String,
    pub summary: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A blog post summary entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub published_at: NaiveDateTime,
}

/// One completed chat exchange, written exactly once per clean stream.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConversationLog {
    pub id: i64,
    /// Opaque per-request token; not a durable user identity
    pub session_id: String,
    pub user_message: String,
    pub assistant_response: String,
    /// Character count of the context spliced into the prompt
    pub context_chars: i64,
    pub created_at: NaiveDateTime,
}
