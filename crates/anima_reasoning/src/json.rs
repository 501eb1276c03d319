//! Lenient JSON extraction from collaborator replies.
//!
//! Models wrap JSON in prose or markdown fences. We try, in order: the whole
//! trimmed text, the outermost `{...}` span, then the outermost `[...]` span.

use serde::de::DeserializeOwned;

/// Parse `T` out of free text, tolerating surrounding prose.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();

    // Try direct parse first
    if let Ok(v) = serde_json::from_str::<T>(trimmed) {
        return Some(v);
    }

    // Object embedded in prose or a code block
    if let Some(span) = span_between(trimmed, '{', '}') {
        if let Ok(v) = serde_json::from_str::<T>(span) {
            return Some(v);
        }
    }

    // Bare array
    if let Some(span) = span_between(trimmed, '[', ']') {
        if let Ok(v) = serde_json::from_str::<T>(span) {
            return Some(v);
        }
    }

    tracing::debug!("Could not parse collaborator reply as JSON: {}", trimmed);
    None
}

fn span_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Strip one layer of matching surrounding quotes.
pub fn strip_quotes(text: &str) -> &str {
    let t = text.trim();
    for q in ['"', '\''] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return t[1..t.len() - 1].trim();
        }
    }
    t
}
