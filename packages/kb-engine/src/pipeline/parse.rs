//! Structured-output parsing for LLM responses.
//!
//! Models often wrap JSON in Markdown code fences or add a sentence around
//! it. Parsing never fails hard: the caller gets either the value or the raw
//! text back and picks its own fallback.

use serde::de::DeserializeOwned;

/// Outcome of parsing a structured model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured<T> {
    Parsed(T),
    Malformed(String),
}

impl<T> Structured<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Malformed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence and a trailing fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag line, if any
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Parse a JSON value from a model response.
///
/// Tries the fence-stripped text first, then the outermost `[...]` or
/// `{...}` span for responses with surrounding prose.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Structured<T> {
    let text = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str(text) {
        return Structured::Parsed(value);
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                    return Structured::Parsed(value);
                }
            }
        }
    }

    Structured::Malformed(raw.to_string())
}
