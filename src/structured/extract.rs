//! Best-effort JSON candidate extraction from free-form model text.
//!
//! Pure string handling, independent of providers and networking: strips a Markdown fenced
//! code block (```` ``` ```` or ```` ```json ````) when one is present, otherwise returns the
//! trimmed input unchanged. Never panics, whatever the input.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:[A-Za-z0-9_-]+)?[ \t]*\r?\n?(.*?)```")
        .expect("fenced block pattern is valid")
});

/// Return the JSON candidate inside `raw`.
///
/// A fence wrapping the whole reply is stripped from both ends, so backticks quoted inside
/// the JSON survive. Otherwise the first fenced block wins. An opening fence without a
/// closing one is stripped as well, since truncated model output is common.
pub fn extract_json_candidate(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| skip_language_tag(rest).strip_suffix("```"))
    {
        return inner.trim();
    }
    if let Some(inner) = FENCED_BLOCK.captures(raw).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        return body.trim();
    }
    trimmed
}

/// Drop a ```` ```json ```` style tag, which must be followed by whitespace.
fn skip_language_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    let after = &rest[tag_len..];
    if tag_len > 0 && (after.is_empty() || after.starts_with(char::is_whitespace)) {
        after
    } else {
        rest
    }
}
