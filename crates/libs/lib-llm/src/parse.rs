//! # Upstream Chunk Parsing
//!
//! One explicit transformation: a single upstream SSE line in, an optional
//! [`UpstreamEvent`] out. Keeping this a pure function keeps the upstream
//! translation boundary independently testable.

use crate::types::{StreamChunk, UpstreamEvent};

/// Sentinel the upstream provider emits to terminate the stream.
const UPSTREAM_DONE: &str = "[DONE]";

/// Parse one newline-delimited line of the upstream SSE body.
///
/// Returns:
/// - `Some(UpstreamEvent::Done)` for the `[DONE]` sentinel or a chunk
///   carrying a populated `finish_reason`
/// - `Some(UpstreamEvent::Delta(text))` for a chunk with delta content
/// - `None` for empty lines, non-`data:` lines (comments, event names),
///   and chunks with nothing of interest (e.g. the initial role-only delta)
pub fn parse_upstream_line(line: &str) -> Option<UpstreamEvent> {
    let line = line.trim();

    let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;
    let data = data.trim();

    if data == UPSTREAM_DONE {
        return Some(UpstreamEvent::Done);
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(err) => {
            tracing::debug!(error = %err, "Skipping unparseable upstream chunk line");
            return None;
        }
    };

    let choice = chunk.choices.first()?;
    if let Some(content) = &choice.delta.content {
        if !content.is_empty() {
            return Some(UpstreamEvent::Delta(content.clone()));
        }
    }
    if choice.finish_reason.is_some() {
        return Some(UpstreamEvent::Done);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_sentinel_terminates() {
        assert_eq!(parse_upstream_line("data: [DONE]"), Some(UpstreamEvent::Done));
        assert_eq!(parse_upstream_line("data:[DONE]"), Some(UpstreamEvent::Done));
    }

    #[test]
    fn delta_content_is_extracted() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        assert_eq!(
            parse_upstream_line(line),
            Some(UpstreamEvent::Delta("Hello".to_string()))
        );
    }

    #[test]
    fn finish_reason_without_content_terminates() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_upstream_line(line), Some(UpstreamEvent::Done));
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        assert_eq!(parse_upstream_line(line), None);
    }

    #[test]
    fn non_data_lines_are_skipped() {
        assert_eq!(parse_upstream_line(""), None);
        assert_eq!(parse_upstream_line(": keep-alive"), None);
        assert_eq!(parse_upstream_line("event: message"), None);
    }

    #[test]
    fn malformed_json_is_skipped() {
        assert_eq!(parse_upstream_line("data: {not json"), None);
    }

    #[test]
    fn empty_choices_are_skipped() {
        assert_eq!(parse_upstream_line(r#"data: {"choices":[]}"#), None);
    }
}
