//! # Relay Client
//!
//! The HTTP half of the stream consumer: POSTs one chat turn, feeds the
//! response bytes through [`FrameDecoder`], and drives the three callbacks.
//!
//! Contract:
//!
//! - zero or more `on_delta(text)` calls in arrival order
//! - exactly one terminal call afterwards: `on_done()` or `on_error(msg)`
//! - a fixed wall-clock timeout covers the whole exchange; on expiry the
//!   in-flight future is dropped, which also closes the connection
//! - a stream that completes without any delta content reports the fixed
//!   "couldn't generate a reply" text instead of an empty message

use crate::decoder::{ClientEvent, FrameDecoder};
use futures_util::StreamExt;
use shared::dto::{ChatRequest, ChatTurn};
use std::time::Duration;

/// User-facing message for HTTP 429 before streaming begins.
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many requests right now. Please wait a moment and try again.";

/// User-facing message for HTTP 402 (provider quota exhausted).
pub const QUOTA_EXHAUSTED_MESSAGE: &str =
    "The assistant's usage quota is exhausted. Please try again later.";

/// User-facing message for HTTP 500.
pub const SERVER_ERROR_MESSAGE: &str = "The assistant ran into a server error. Please try again.";

/// User-facing message for HTTP 503.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The assistant is temporarily unavailable. Please try again shortly.";

/// Generic fallback for any other failure to connect or read.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Connection error. Please check your network and try again.";

/// Reported when no terminal signal arrives within the timeout window.
pub const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";

/// Substituted when the stream completes with zero delta content.
pub const EMPTY_REPLY_MESSAGE: &str =
    "Sorry, I couldn't generate a reply. Please try asking again.";

/// Default wall-clock timeout for one exchange.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Map a pre-stream HTTP status to its user-facing message.
pub fn map_status_message(status: u16) -> &'static str {
    match status {
        402 => QUOTA_EXHAUSTED_MESSAGE,
        429 => RATE_LIMITED_MESSAGE,
        500 => SERVER_ERROR_MESSAGE,
        503 => SERVICE_UNAVAILABLE_MESSAGE,
        _ => CONNECTION_ERROR_MESSAGE,
    }
}

/// How one exchange ended, before the terminal callback is chosen.
enum Outcome {
    Done(String),
    Failed(String),
}

/// Client for the relay's streaming chat endpoint.
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RelayClient {
    /// Create a client for the given relay endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one message and stream the reply through the callbacks.
    ///
    /// Returns the full assistant text on clean completion, `None` on any
    /// error. Exactly one of `on_done`/`on_error` is invoked, after all
    /// `on_delta` calls.
    pub async fn send(
        &self,
        message: &str,
        history: &[ChatTurn],
        mut on_delta: impl FnMut(&str),
        on_done: impl FnOnce(),
        on_error: impl FnOnce(String),
    ) -> Option<String> {
        let exchange = self.run_exchange(message, history, &mut on_delta);

        match tokio::time::timeout(self.timeout, exchange).await {
            // Dropping the exchange future closes the connection, so the
            // server sees the disconnect rather than a silent abandon.
            Err(_elapsed) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Relay exchange timed out");
                on_error(TIMEOUT_MESSAGE.to_string());
                None
            }
            Ok(Outcome::Done(text)) => {
                let text = if text.is_empty() {
                    on_delta(EMPTY_REPLY_MESSAGE);
                    EMPTY_REPLY_MESSAGE.to_string()
                } else {
                    text
                };
                on_done();
                Some(text)
            }
            Ok(Outcome::Failed(msg)) => {
                on_error(msg);
                None
            }
        }
    }

    async fn run_exchange(
        &self,
        message: &str,
        history: &[ChatTurn],
        on_delta: &mut impl FnMut(&str),
    ) -> Outcome {
        let request = ChatRequest {
            message: message.to_string(),
            conversation_history: history.to_vec(),
        };

        let resp = match self.http.post(&self.endpoint).json(&request).send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to reach relay endpoint");
                return Outcome::Failed(CONNECTION_ERROR_MESSAGE.to_string());
            }
        };

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            tracing::warn!(status, "Relay rejected chat request before streaming");
            return Outcome::Failed(map_status_message(status).to_string());
        }

        let mut decoder = FrameDecoder::new();
        let mut accumulated = String::new();
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!(error = %err, "Read error mid-stream");
                    return Outcome::Failed(CONNECTION_ERROR_MESSAGE.to_string());
                }
            };

            for event in decoder.push(&chunk) {
                match event {
                    ClientEvent::Delta(text) => {
                        accumulated.push_str(&text);
                        on_delta(&text);
                    }
                    ClientEvent::Done => return Outcome::Done(accumulated),
                    ClientEvent::Error(msg) => return Outcome::Failed(msg),
                }
            }
        }

        // Stream closed without an explicit terminal frame.
        match decoder.finish() {
            Some(ClientEvent::Error(msg)) => Outcome::Failed(msg),
            _ => Outcome::Done(accumulated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::Router;

    /// Serve the given router on an ephemeral port; returns the chat URL.
    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        format!("http://{}/api/chat", addr)
    }

    fn sse_response(body: &'static str) -> Response {
        (
            [(header::CONTENT_TYPE, "text/event-stream")],
            body.to_string(),
        )
            .into_response()
    }

    #[tokio::test]
    async fn deltas_arrive_in_order_and_concatenate() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                sse_response(
                    "data: {\"type\":\"delta\",\"content\":\"Hello\"}\n\ndata: {\"type\":\"delta\",\"content\":\" world\"}\n\ndata: {\"type\":\"done\",\"content\":\"\"}\n\n",
                )
            }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let mut deltas: Vec<String> = Vec::new();
        let mut done = false;
        let mut error: Option<String> = None;

        let full = client
            .send(
                "hi",
                &[],
                |d| deltas.push(d.to_string()),
                || done = true,
                |e| error = Some(e),
            )
            .await;

        assert_eq!(deltas, vec!["Hello".to_string(), " world".to_string()]);
        assert!(done);
        assert_eq!(error, None);
        assert_eq!(full.as_deref(), Some("Hello world"));
    }

    #[tokio::test]
    async fn multibyte_delta_split_across_body_chunks_survives() {
        const BODY: &str =
            "data: {\"type\":\"delta\",\"content\":\"🎉\"}\n\ndata: {\"type\":\"done\",\"content\":\"\"}\n\n";

        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                // Deliver the body in two chunks split two bytes into the
                // emoji's four-byte UTF-8 sequence.
                let bytes = BODY.as_bytes();
                let split = bytes.iter().position(|&b| b >= 0x80).expect("emoji bytes") + 2;
                let (a, b) = bytes.split_at(split);
                let chunks = futures_util::stream::iter([
                    Ok::<&'static [u8], std::convert::Infallible>(a),
                    Ok(b),
                ]);
                (
                    [(header::CONTENT_TYPE, "text/event-stream")],
                    axum::body::Body::from_stream(chunks),
                )
                    .into_response()
            }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let mut deltas: Vec<String> = Vec::new();
        let mut done = false;
        let full = client
            .send("hi", &[], |d| deltas.push(d.to_string()), || done = true, |_| {})
            .await;

        assert_eq!(deltas, vec!["🎉".to_string()]);
        assert!(done);
        assert_eq!(full.as_deref(), Some("🎉"));
    }

    #[tokio::test]
    async fn rate_limit_status_maps_to_literal_message() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { StatusCode::TOO_MANY_REQUESTS }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let mut error: Option<String> = None;
        let full = client
            .send("hi", &[], |_| {}, || {}, |e| error = Some(e))
            .await;

        assert_eq!(error.as_deref(), Some(RATE_LIMITED_MESSAGE));
        assert_eq!(full, None);
    }

    #[tokio::test]
    async fn unmapped_status_uses_generic_message() {
        let app = Router::new().route("/api/chat", post(|| async { StatusCode::IM_A_TEAPOT }));
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let mut error: Option<String> = None;
        client
            .send("hi", &[], |_| {}, || {}, |e| error = Some(e))
            .await;

        assert_eq!(error.as_deref(), Some(CONNECTION_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn empty_completion_substitutes_fallback_reply() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { sse_response("data: {\"type\":\"done\",\"content\":\"\"}\n\n") }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let mut deltas: Vec<String> = Vec::new();
        let mut done = false;
        let full = client
            .send("hi", &[], |d| deltas.push(d.to_string()), || done = true, |_| {})
            .await;

        assert!(done);
        assert_eq!(deltas, vec![EMPTY_REPLY_MESSAGE.to_string()]);
        assert_eq!(full.as_deref(), Some(EMPTY_REPLY_MESSAGE));
    }

    #[tokio::test]
    async fn error_frame_surfaces_through_on_error() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                sse_response(
                    "data: {\"type\":\"delta\",\"content\":\"part\"}\n\ndata: {\"type\":\"error\",\"content\":\"upstream fell over\"}\n\n",
                )
            }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let mut deltas: Vec<String> = Vec::new();
        let mut error: Option<String> = None;
        let full = client
            .send("hi", &[], |d| deltas.push(d.to_string()), || {}, |e| error = Some(e))
            .await;

        // Partial content already delivered stays delivered.
        assert_eq!(deltas, vec!["part".to_string()]);
        assert_eq!(error.as_deref(), Some("upstream fell over"));
        assert_eq!(full, None);
    }

    #[tokio::test]
    async fn slow_server_trips_client_timeout() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                sse_response("data: [DONE]\n\n")
            }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url).with_timeout(Duration::from_millis(200));

        let mut error: Option<String> = None;
        let mut done = false;
        let full = client
            .send("hi", &[], |_| {}, || done = true, |e| error = Some(e))
            .await;

        assert!(!done);
        assert_eq!(error.as_deref(), Some(TIMEOUT_MESSAGE));
        assert_eq!(full, None);
    }

    #[tokio::test]
    async fn unreachable_server_reports_connection_error() {
        // Port 1 is never listening.
        let client = RelayClient::new("http://127.0.0.1:1/api/chat");

        let mut error: Option<String> = None;
        client
            .send("hi", &[], |_| {}, || {}, |e| error = Some(e))
            .await;

        assert_eq!(error.as_deref(), Some(CONNECTION_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn history_is_forwarded_in_request_body() {
        use axum::extract::Json;

        let app = Router::new().route(
            "/api/chat",
            post(|Json(req): Json<ChatRequest>| async move {
                assert_eq!(req.conversation_history.len(), 2);
                assert_eq!(req.message, "third");
                sse_response("data: [DONE]\n\n")
            }),
        );
        let url = spawn_server(app).await;
        let client = RelayClient::new(url);

        let history = vec![ChatTurn::user("first"), ChatTurn::assistant("second")];
        let mut done = false;
        client
            .send("third", &history, |_| {}, || done = true, |_| {})
            .await;
        assert!(done);
    }
}
