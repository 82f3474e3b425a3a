//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

/// Marker appended to text cut short by [`truncate_text`]
pub const TRUNCATION_MARKER: char = '…';

/// Truncate text to at most `max_chars` characters
///
/// When the text is longer, it is cut to `max_chars - 1` characters and
/// [`TRUNCATION_MARKER`] is appended. Counting is by `char`, never by byte,
/// so multi-byte text cannot be split mid-character.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push(TRUNCATION_MARKER);
    truncated
}

/// Trim a string, returning `None` when nothing is left
pub fn non_empty_trimmed(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
