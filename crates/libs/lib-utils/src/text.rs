//! # Text Utilities
//!
//! Helpers for enforcing character budgets on assembled text.

/// Truncate a string to at most `max_chars` characters.
///
/// Counts `char`s, not bytes, so the cut never lands inside a UTF-8
/// sequence. Returns the input unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
