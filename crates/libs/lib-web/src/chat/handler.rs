//! # Chat Relay Handler
//!
//! The POST `/api/chat` endpoint. Validates the request, assembles context,
//! opens a streaming completion against the upstream backend, and re-emits
//! the reply as the relay's own SSE frame stream.
//!
//! Upstream rejection before any bytes stream maps to a plain JSON error
//! response carrying the upstream status. Once streaming has begun the HTTP
//! status is already 200, so failures surface as an `error` frame instead.
//! Exactly one terminal frame (`done` or `error`) is emitted per exchange,
//! and a conversation log row is written only when the exchange completed
//! cleanly.

// region: --- Imports
use crate::chat::{system_prompt, ContextBuilder};
use crate::server::AppState;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use lib_core::model::store::ConversationLogRepository;
use lib_core::AppError;
use lib_llm::{LlmError, UpstreamEvent, UpstreamMessage};
use lib_utils::validate_not_empty;
use shared::dto::{ChatRequest, ChatRole, ErrorResponse, RelayFrame};
use std::convert::Infallible;
use tracing::{error, info, warn};
use uuid::Uuid;
// endregion: --- Imports

/// Message sent in an `error` frame when the upstream stream breaks mid-reply.
const INTERRUPTED_MESSAGE: &str = "The assistant was interrupted. Please try again.";

fn frame_event(frame: &RelayFrame) -> Event {
    match Event::default().json_data(frame) {
        Ok(event) => event,
        // a frame is two plain strings; serialization does not fail on those
        Err(_) => Event::default().data(r#"{"type":"error","content":"internal error"}"#),
    }
}

/// Handle one chat exchange.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if let Err(msg) = validate_not_empty(&req.message, "message") {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg })).into_response();
    }

    let session_id = Uuid::new_v4().to_string();
    info!(
        session_id = %session_id,
        message_chars = req.message.chars().count(),
        history_turns = req.conversation_history.len(),
        "[CHAT] Exchange opened"
    );

    let builder = ContextBuilder::new(
        state.config.context_char_budget,
        state.config.context_slice_size,
    );
    let context = match builder
        .assemble(&state.db, state.classifier.as_ref(), &req.message)
        .await
    {
        Ok(context) => context,
        Err(err) => {
            error!(error = %err, session_id = %session_id, "[CHAT] Context assembly failed");
            return err.into_response();
        }
    };

    // System prompt first, then the most recent history turns, then the
    // new message. Older turns beyond the cap are dropped.
    let mut messages = vec![UpstreamMessage::system(system_prompt(&context.text))];
    let skip = req
        .conversation_history
        .len()
        .saturating_sub(state.config.history_max_turns);
    for turn in &req.conversation_history[skip..] {
        messages.push(match turn.role {
            ChatRole::User => UpstreamMessage::user(&turn.content),
            ChatRole::Assistant => UpstreamMessage::assistant(&turn.content),
        });
    }
    messages.push(UpstreamMessage::user(&req.message));

    let upstream = match state.backend.stream_chat(messages).await {
        Ok(stream) => stream,
        Err(LlmError::Api { status, message }) => {
            warn!(
                status,
                session_id = %session_id,
                "[CHAT] Upstream rejected completion request"
            );
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            return (code, Json(ErrorResponse { error: message })).into_response();
        }
        Err(err) => {
            error!(error = %err, session_id = %session_id, "[CHAT] Failed to reach upstream");
            return AppError::Upstream(err.to_string()).into_response();
        }
    };

    let db = state.db.clone();
    let user_message = req.message;
    let context_chars = context.chars() as i64;

    let stream = async_stream::stream! {
        let mut upstream = upstream;
        let mut accumulated = String::new();

        loop {
            match upstream.next().await {
                Some(Ok(UpstreamEvent::Delta(text))) => {
                    accumulated.push_str(&text);
                    yield Ok::<Event, Infallible>(frame_event(&RelayFrame::delta(text)));
                }
                // Upstream EOF without a sentinel still counts as a clean
                // completion of whatever was accumulated.
                Some(Ok(UpstreamEvent::Done)) | None => {
                    if let Err(err) = ConversationLogRepository::insert(
                        &db,
                        &session_id,
                        &user_message,
                        &accumulated,
                        context_chars,
                    )
                    .await
                    {
                        error!(
                            error = %err,
                            session_id = %session_id,
                            "[CHAT] Failed to write conversation log"
                        );
                    }
                    info!(
                        session_id = %session_id,
                        reply_chars = accumulated.chars().count(),
                        "[CHAT] Exchange complete"
                    );
                    yield Ok(frame_event(&RelayFrame::done()));
                    break;
                }
                Some(Err(err)) => {
                    error!(
                        error = %err,
                        session_id = %session_id,
                        "[CHAT] Upstream stream failed mid-reply"
                    );
                    yield Ok(frame_event(&RelayFrame::error(INTERRUPTED_MESSAGE)));
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::KeywordClassifier;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use lib_core::{Config, DbPool};
    use lib_llm::{CompletionBackend, EventStream};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    async fn setup_test_db() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        for ddl in [
            r#"CREATE TABLE projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                tech_stack TEXT NOT NULL,
                link TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
            r#"CREATE TABLE skills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                proficiency INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
            r#"CREATE TABLE experience (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT NOT NULL,
                role TEXT NOT NULL,
                summary TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
            r#"CREATE TABLE blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                published_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
            r#"CREATE TABLE conversation_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_message TEXT NOT NULL,
                assistant_response TEXT NOT NULL,
                context_chars INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"#,
        ] {
            sqlx::query(ddl).execute(&pool).await.expect("create table");
        }

        pool
    }

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            llm_api_key: "test-key".to_string(),
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_max_tokens: 500,
            llm_temperature: 0.7,
            context_char_budget: 4000,
            context_slice_size: 5,
            history_max_turns: 10,
        }
    }

    /// Backend that replays a canned event script instead of hitting the
    /// network.
    struct ScriptedBackend {
        reject: Option<(u16, String)>,
        script: Mutex<Option<Vec<Result<UpstreamEvent, LlmError>>>>,
        seen_messages: Mutex<Vec<UpstreamMessage>>,
    }

    impl ScriptedBackend {
        fn streaming(events: Vec<Result<UpstreamEvent, LlmError>>) -> Self {
            Self {
                reject: None,
                script: Mutex::new(Some(events)),
                seen_messages: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(status: u16, message: &str) -> Self {
            Self {
                reject: Some((status, message.to_string())),
                script: Mutex::new(None),
                seen_messages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn stream_chat(
            &self,
            messages: Vec<UpstreamMessage>,
        ) -> Result<EventStream, LlmError> {
            *self.seen_messages.lock().unwrap() = messages;
            if let Some((status, message)) = &self.reject {
                return Err(LlmError::Api {
                    status: *status,
                    message: message.clone(),
                });
            }
            let events = self
                .script
                .lock()
                .unwrap()
                .take()
                .expect("script already consumed");
            Ok(Box::pin(futures_util::stream::iter(events)))
        }
    }

    fn test_app(pool: DbPool, backend: Arc<ScriptedBackend>) -> Router {
        let state = AppState {
            db: pool,
            config: test_config(),
            backend,
            classifier: Arc::new(KeywordClassifier::new()),
        };
        Router::new()
            .route("/api/chat", post(handle_chat))
            .with_state(state)
    }

    async fn post_chat(app: Router, body: serde_json::Value) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn read_frames(response: axum::response::Response) -> Vec<RelayFrame> {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        text.lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|payload| RelayFrame::parse(payload).expect("valid frame"))
            .collect()
    }

    #[tokio::test]
    async fn streams_deltas_then_exactly_one_done() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            Ok(UpstreamEvent::Delta("Hel".to_string())),
            Ok(UpstreamEvent::Delta("lo!".to_string())),
            Ok(UpstreamEvent::Done),
        ]));
        let app = test_app(pool, backend);

        let response = post_chat(app, serde_json::json!({ "message": "hi" })).await;
        assert_eq!(response.status(), StatusCode::OK);

        let frames = read_frames(response).await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], RelayFrame::delta("Hel"));
        assert_eq!(frames[1], RelayFrame::delta("lo!"));
        assert_eq!(frames[2], RelayFrame::done());
    }

    #[tokio::test]
    async fn clean_completion_writes_one_log_row() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            Ok(UpstreamEvent::Delta("Hello there".to_string())),
            Ok(UpstreamEvent::Done),
        ]));
        let app = test_app(pool.clone(), backend);

        let response = post_chat(app, serde_json::json!({ "message": "hi" })).await;
        let _ = read_frames(response).await;

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT user_message, assistant_response FROM conversation_logs",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "hi");
        assert_eq!(rows[0].1, "Hello there");
    }

    #[tokio::test]
    async fn mid_stream_failure_emits_error_frame_and_no_log() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::streaming(vec![
            Ok(UpstreamEvent::Delta("partial".to_string())),
            Err(LlmError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        ]));
        let app = test_app(pool.clone(), backend);

        let response = post_chat(app, serde_json::json!({ "message": "hi" })).await;
        assert_eq!(response.status(), StatusCode::OK);

        let frames = read_frames(response).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], RelayFrame::delta("partial"));
        assert_eq!(frames[1], RelayFrame::error(INTERRUPTED_MESSAGE));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversation_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn upstream_eof_without_sentinel_completes_cleanly() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::streaming(vec![Ok(UpstreamEvent::Delta(
            "half a reply".to_string(),
        ))]));
        let app = test_app(pool.clone(), backend);

        let response = post_chat(app, serde_json::json!({ "message": "hi" })).await;
        let frames = read_frames(response).await;
        assert_eq!(frames.last(), Some(&RelayFrame::done()));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversation_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn upstream_rejection_passes_status_through() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::rejecting(429, "rate limit exceeded"));
        let app = test_app(pool, backend);

        let response = post_chat(app, serde_json::json!({ "message": "hi" })).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "rate limit exceeded");
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_upstream() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::rejecting(500, "should not be called"));
        let app = test_app(pool, backend);

        let response = post_chat(app, serde_json::json!({ "message": "   " })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_is_capped_to_most_recent_turns() {
        let pool = setup_test_db().await;
        let backend = Arc::new(ScriptedBackend::streaming(vec![Ok(UpstreamEvent::Done)]));
        let app = test_app(pool, backend.clone());

        // 12 turns against a cap of 10; the two oldest must be dropped.
        let history: Vec<serde_json::Value> = (0..12)
            .map(|i| {
                serde_json::json!({
                    "role": if i % 2 == 0 { "user" } else { "assistant" },
                    "content": format!("turn {}", i),
                })
            })
            .collect();

        let response = post_chat(
            app,
            serde_json::json!({ "message": "hi", "conversation_history": history }),
        )
        .await;
        let _ = read_frames(response).await;

        let seen = backend.seen_messages.lock().unwrap();
        // system prompt + 10 history turns + the new message
        assert_eq!(seen.len(), 12);
        assert_eq!(seen[1].content, "turn 2");
        assert_eq!(seen[10].content, "turn 11");
        assert_eq!(seen[11].content, "hi");
    }

    #[tokio::test]
    async fn context_is_assembled_from_matched_bucket() {
        let pool = setup_test_db().await;
        sqlx::query(
            "INSERT INTO projects (title, description, tech_stack, link) VALUES (?, ?, ?, NULL)",
        )
        .bind("Relay")
        .bind("An SSE streaming relay")
        .bind("Rust, axum")
        .execute(&pool)
        .await
        .unwrap();

        let backend = Arc::new(ScriptedBackend::streaming(vec![Ok(UpstreamEvent::Done)]));
        let app = test_app(pool, backend.clone());

        let response = post_chat(
            app,
            serde_json::json!({ "message": "tell me about your projects" }),
        )
        .await;
        let _ = read_frames(response).await;

        let seen = backend.seen_messages.lock().unwrap();
        assert_eq!(seen[0].role, "system");
        assert!(seen[0].content.contains("PROJECTS:"));
        assert!(seen[0].content.contains("Relay"));
    }
}
