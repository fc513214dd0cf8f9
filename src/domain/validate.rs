//! Typed field validators built on the sanitizer.
//!
//! Validators are total over arbitrary JSON values and never panic. Invalid
//! input degrades to a sentinel rather than an error: `None` for age,
//! location and email ("not provided"), `0` for completion time ("unknown
//! timing"). The asymmetry is deliberate: completion time is advisory
//! telemetry, while the other fields gate nothing and are simply absent.

use crate::domain::sanitize::{sanitize_text, truncate_chars, EMAIL_MAX, LOCATION_MAX};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Minimum accepted age, inclusive.
pub const AGE_MIN: u32 = 18;
/// Maximum accepted age, inclusive.
pub const AGE_MAX: u32 = 118;
/// Maximum plausible completion time in seconds (one hour).
pub const COMPLETION_TIME_MAX: u32 = 3600;

/// `local@domain.tld` shape: one `@`, at least one `.` after it, no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Coerce a JSON value to a finite number, accepting numeric strings.
fn numeric_value(input: &Value) -> Option<f64> {
    let num = match input {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if !s.is_empty() => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    num.is_finite().then_some(num)
}

/// Validate an age, returning `None` for anything outside `[AGE_MIN, AGE_MAX]`.
///
/// Accepts JSON numbers and numeric strings; values are rounded to the
/// nearest integer before the bounds check.
pub fn validate_age(input: &Value) -> Option<u32> {
    let age = numeric_value(input)?.round();
    if (AGE_MIN as f64..=AGE_MAX as f64).contains(&age) {
        Some(age as u32)
    } else {
        None
    }
}

/// Validate a completion time in seconds, with `0` as the sentinel for
/// unknown or untrusted timing.
pub fn validate_completion_time(input: &Value) -> u32 {
    let Some(num) = numeric_value(input) else {
        return 0;
    };
    let time = num.round();
    if (0.0..=COMPLETION_TIME_MAX as f64).contains(&time) {
        time as u32
    } else {
        0
    }
}

/// Sanitize a location string; an empty result becomes `None`.
pub fn validate_location(input: &Value) -> Option<String> {
    let Value::String(s) = input else {
        return None;
    };
    let sanitized = sanitize_text(s, LOCATION_MAX);
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Validate an email address: trim, lowercase, cap the length, then check
/// the shape. Anything else is `None`.
pub fn validate_email(input: &Value) -> Option<String> {
    let Value::String(s) = input else {
        return None;
    };
    let candidate = truncate_chars(&s.trim().to_lowercase(), EMAIL_MAX);
    if EMAIL_RE.is_match(&candidate) {
        Some(candidate)
    } else {
        None
    }
}
