//! # Conversation Log Repository
//!
//! Append-only persistence for completed chat exchanges.
//!
//! One row is written per cleanly completed stream: the session token, the
//! user's raw message, the fully accumulated assistant response, and the
//! size of the context that grounded it. Rows are never updated or deleted
//! by the relay; failed or aborted streams write nothing.

use super::models::ConversationLog;
use super::DbPool;
use sqlx::query_as;

/// Conversation log repository for database operations.
pub struct ConversationLogRepository;

impl ConversationLogRepository {
    /// Insert one completed exchange.
    ///
    /// A single-row insert with no read-modify-write, so the store's
    /// native atomicity is the only transactional discipline needed.
    pub async fn insert(
        pool: &DbPool,
        session_id: &str,
        user_message: &str,
        assistant_response: &str,
        context_chars: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO conversation_logs (session_id, user_message, assistant_response, context_chars, created_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(session_id)
        .bind(user_message)
        .bind(assistant_response)
        .bind(context_chars)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Fetch the most recent completed exchanges, newest first.
    pub async fn list_recent(
        pool: &DbPool,
        limit: i64,
    ) -> Result<Vec<ConversationLog>, sqlx::Error> {
        query_as::<_, ConversationLog>(
            "SELECT * FROM conversation_logs ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Count rows written for one session.
    pub async fn count_for_session(pool: &DbPool, session_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversation_logs WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        sqlx::query(
            r#"
            CREATE TABLE conversation_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_message TEXT NOT NULL,
                assistant_response TEXT NOT NULL,
                context_chars INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to create conversation_logs table");

        pool
    }

    #[tokio::test]
    async fn insert_then_list() {
        let pool = setup_test_db().await;

        ConversationLogRepository::insert(&pool, "session-1", "hi", "hello there", 1234)
            .await
            .unwrap();

        let logs = ConversationLogRepository::list_recent(&pool, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].session_id, "session-1");
        assert_eq!(logs[0].user_message, "hi");
        assert_eq!(logs[0].assistant_response, "hello there");
        assert_eq!(logs[0].context_chars, 1234);
    }

    #[tokio::test]
    async fn count_is_per_session() {
        let pool = setup_test_db().await;

        ConversationLogRepository::insert(&pool, "a", "q1", "r1", 10)
            .await
            .unwrap();
        ConversationLogRepository::insert(&pool, "a", "q2", "r2", 20)
            .await
            .unwrap();
        ConversationLogRepository::insert(&pool, "b", "q3", "r3", 30)
            .await
            .unwrap();

        assert_eq!(
            ConversationLogRepository::count_for_session(&pool, "a").await.unwrap(),
            2
        );
        assert_eq!(
            ConversationLogRepository::count_for_session(&pool, "b").await.unwrap(),
            1
        );
        assert_eq!(
            ConversationLogRepository::count_for_session(&pool, "c").await.unwrap(),
            0
        );
    }
}
