//! # Content Repositories
//!
//! Read-only database access for the portfolio content tables.
//!
//! Context assembly only ever needs small, deterministic slices: the most
//! recent N rows of a table in a fixed order. Every query here orders by a
//! stable column so that assembling context twice over the same rows yields
//! byte-identical text.

use super::models::{BlogPost, Experience, Project, Skill};
use super::DbPool;
use sqlx::query_as;

/// Project repository for database operations.
pub struct ProjectRepository;

impl ProjectRepository {
    /// Fetch the most recently added projects, newest first.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `limit` - Maximum number of rows to return
    pub async fn list_recent(pool: &DbPool, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        query_as::<_, Project>(
            "SELECT * FROM projects ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

/// Skill repository for database operations.
pub struct SkillRepository;

impl SkillRepository {
    /// Fetch the highest-proficiency skills first.
    ///
    /// Ties break on `id` so the ordering is total and the assembled
    /// context stays deterministic.
    pub async fn list_top(pool: &DbPool, limit: i64) -> Result<Vec<Skill>, sqlx::Error> {
        query_as::<_, Skill>(
            "SELECT * FROM skills ORDER BY proficiency DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

/// Work-experience repository for database operations.
pub struct ExperienceRepository;

impl ExperienceRepository {
    /// Fetch the most recent positions, newest first.
    pub async fn list_recent(pool: &DbPool, limit: i64) -> Result<Vec<Experience>, sqlx::Error> {
        query_as::<_, Experience>(
            "SELECT * FROM experience ORDER BY start_date DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

/// Blog post repository for database operations.
pub struct BlogPostRepository;

impl BlogPostRepository {
    /// Fetch the most recently published posts, newest first.
    pub async fn list_recent(pool: &DbPool, limit: i64) -> Result<Vec<BlogPost>, sqlx::Error> {
        query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts ORDER BY published_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
