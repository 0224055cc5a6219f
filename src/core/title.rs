//! Human-readable titles for sessions.
//!
//! Derivation is pure: the first user prompt yields a short snippet, and an
//! empty prompt falls back to a timestamp formatted from the session id. The
//! controller only calls [`derive`] while a session still carries the generic
//! default, so an explicit rename is never overwritten.

use crate::core::session::parse_epoch_id;

/// Title given to a session before anything better is known.
pub const DEFAULT_TITLE: &str = "New Chat";

const SNIPPET_WORDS: usize = 8;

/// Derive a title from the first prompt, falling back to [`fallback`] when
/// the prompt is blank.
pub fn derive(prompt: &str, id: &str) -> String {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    if words.is_empty() {
        return fallback(id);
    }
    let mut snippet = words[..words.len().min(SNIPPET_WORDS)].join(" ");
    if words.len() > SNIPPET_WORDS {
        snippet.push_str("...");
    }
    snippet
}

/// Timestamp-formatted title when the id is a fractional epoch value,
/// otherwise the generic default.
pub fn fallback(id: &str) -> String {
    match parse_epoch_id(id) {
        Some(created) => created.format("Chat %Y-%m-%d %H:%M").to_string(),
        None => DEFAULT_TITLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_truncates_long_prompts_to_eight_words() {
        let title = derive(
            "Tell me about your roof replacement project please soon",
            "1700000000.0",
        );
        assert_eq!(title, "Tell me about your roof replacement project please...");
    }

    #[test]
    fn derive_keeps_short_prompts_verbatim() {
        assert_eq!(derive("Hello there", "1700000000.0"), "Hello there");
    }

    #[test]
    fn derive_collapses_interior_whitespace() {
        assert_eq!(derive("  spaced \t out   words ", "x"), "spaced out words");
    }

    #[test]
    fn blank_prompt_falls_back_to_timestamp() {
        let title = derive("   ", "1700000000.0");
        assert!(title.starts_with("Chat 2023-11-14"), "got {title:?}");
    }

    #[test]
    fn non_numeric_id_falls_back_to_default() {
        assert_eq!(derive("", "session-abc"), DEFAULT_TITLE);
        assert_eq!(fallback("session-abc"), DEFAULT_TITLE);
    }
}
