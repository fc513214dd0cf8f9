//! Denylist text sanitization for untrusted survey input.
//!
//! This is not full HTML sanitization: stored values are rendered as plain
//! text downstream, so it is enough to strip the constructs that would be
//! dangerous if that assumption ever broke, clamp the length, and move on.
//!
//! Stripping happens before trimming and truncation. Truncating first could
//! cut a dangerous tag in half and leave a residual fragment behind.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a free-text survey answer.
pub const TEXT_QUESTION_MAX: usize = 500;
/// Maximum length of the location field.
pub const LOCATION_MAX: usize = 100;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 100;

/// Paired dangerous elements, removed together with their content.
static TAG_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<script[^>]*>.*?</script\s*>",
        r"|<iframe[^>]*>.*?</iframe\s*>",
        r"|<object[^>]*>.*?</object\s*>",
        r"|<embed[^>]*>.*?</embed\s*>",
    ))
    .expect("tag block pattern is valid")
});

/// Stray opening or closing dangerous tags, including unclosed fragments
/// like a bare `<script` at the end of the input.
static STRAY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:script|iframe|object|embed)[^>]*>?").expect("stray tag pattern is valid")
});

/// Inline event handler attributes of the form `onclick="..."`.
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bon\w+\s*=\s*["'][^"']*["']"#).expect("event handler pattern is valid")
});

/// The `javascript:` URL scheme.
static JS_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("scheme pattern is valid"));

/// Reduce arbitrary untrusted text to a bounded, markup-free string.
///
/// Removes `<script>`, `<iframe>`, `<object>` and `<embed>` blocks, inline
/// `on*="..."` event handlers, the `javascript:` scheme and the characters
/// `'`, `"` and `;`, then trims whitespace and truncates to `max_len`
/// characters.
///
/// The result never contains any of the denylisted constructs, and the
/// function is idempotent: sanitizing already-sanitized text is a no-op.
///
/// # Example
/// ```
/// use survey_guard::{sanitize_text, TEXT_QUESTION_MAX};
///
/// let cleaned = sanitize_text("<script>alert(1)</script>hello", TEXT_QUESTION_MAX);
/// assert_eq!(cleaned, "hello");
/// ```
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    // Removing one construct can splice surrounding text into a new one
    // ("<scr<script></script>ipt>"), so strip until a fixpoint. Every pass
    // only deletes, so the loop terminates.
    let mut cleaned = strip_dangerous(input);
    loop {
        let next = strip_dangerous(&cleaned);
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    let truncated = truncate_chars(cleaned.trim(), max_len);
    // Truncation may expose trailing whitespace that was interior before.
    truncated.trim_end().to_string()
}

fn strip_dangerous(input: &str) -> String {
    let stripped = TAG_BLOCK.replace_all(input, "");
    let stripped = STRAY_TAG.replace_all(&stripped, "");
    let stripped = EVENT_HANDLER.replace_all(&stripped, "");
    let stripped = JS_SCHEME.replace_all(&stripped, "");
    stripped
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | ';'))
        .collect()
}

/// Truncate to at most `max_len` characters, respecting char boundaries.
pub(crate) fn truncate_chars(input: &str, max_len: usize) -> String {
    match input.char_indices().nth(max_len) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}
