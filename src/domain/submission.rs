//! Whole-record validation for survey and email submissions.
//!
//! These functions are total over arbitrary JSON: absent or malformed fields
//! degrade to empty string / `None` / `0`, and rejection decisions ("no
//! minimum data", "invalid email") belong to the caller inspecting the
//! returned structure, not to exceptions raised here.

use crate::domain::sanitize::{sanitize_text, TEXT_QUESTION_MAX};
use crate::domain::validate::{
    validate_age, validate_completion_time, validate_email, validate_location,
};
use serde::Serialize;
use serde_json::Value;

static NULL: Value = Value::Null;

/// A survey submission after sanitization and validation.
///
/// Every text field is free of the sanitizer's denylisted constructs and no
/// longer than its cap. Constructed fresh per request from untrusted input
/// and immutable afterwards; serializes with the storage schema's field
/// names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidatedSubmission {
    pub q1: String,
    pub q2: String,
    pub q3: String,
    pub q4: String,
    pub q5: String,
    pub q6: String,
    pub q7: String,
    pub q8: String,
    pub q9: String,
    pub q10: String,
    pub q11: String,
    pub q12: String,
    pub q13: String,
    /// Write-in text attached to question 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1_option: Option<String>,
    /// Seconds the respondent spent, `0` when unknown
    pub completion_time: u32,
    pub login_age: Option<u32>,
    pub login_location: Option<String>,
}

impl ValidatedSubmission {
    /// The thirteen answer fields, in order.
    pub fn answers(&self) -> [&str; 13] {
        [
            &self.q1, &self.q2, &self.q3, &self.q4, &self.q5, &self.q6, &self.q7, &self.q8,
            &self.q9, &self.q10, &self.q11, &self.q12, &self.q13,
        ]
    }

    /// Whether at least one answer field carries content.
    ///
    /// Metadata fields and the write-in option do not count; a submission
    /// with only an age or a location is an empty shell.
    pub fn has_minimum_data(&self) -> bool {
        self.answers().iter().any(|a| !a.trim().is_empty())
    }
}

/// A validated email request: the address (if valid) and the submission to
/// send a copy of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailSubmission {
    pub email: Option<String>,
    pub form_data: ValidatedSubmission,
}

fn field<'a>(raw: &'a Value, key: &str) -> &'a Value {
    raw.get(key).unwrap_or(&NULL)
}

fn text_field(raw: &Value, key: &str) -> String {
    match field(raw, key) {
        Value::String(s) => sanitize_text(s, TEXT_QUESTION_MAX),
        _ => String::new(),
    }
}

/// Validate and sanitize an entire survey submission.
///
/// Never fails: each answer is sanitized independently, metadata is
/// delegated to the field validators, and any non-object input yields the
/// all-empty submission.
pub fn validate_survey_submission(raw: &Value) -> ValidatedSubmission {
    let mut validated = ValidatedSubmission {
        q1: text_field(raw, "q1"),
        q2: text_field(raw, "q2"),
        q3: text_field(raw, "q3"),
        q4: text_field(raw, "q4"),
        q5: text_field(raw, "q5"),
        q6: text_field(raw, "q6"),
        q7: text_field(raw, "q7"),
        q8: text_field(raw, "q8"),
        q9: text_field(raw, "q9"),
        q10: text_field(raw, "q10"),
        q11: text_field(raw, "q11"),
        q12: text_field(raw, "q12"),
        q13: text_field(raw, "q13"),
        q1_option: None,
        completion_time: validate_completion_time(field(raw, "completion_time")),
        login_age: validate_age(field(raw, "login_age")),
        login_location: validate_location(field(raw, "login_location")),
    };

    let option = text_field(raw, "q1_option");
    if !option.is_empty() {
        validated.q1_option = Some(option);
    }

    validated
}

/// Validate an email request payload: the `email` key plus a nested
/// `formData` object (treated as `{}` when absent).
pub fn validate_email_submission(raw: &Value) -> EmailSubmission {
    EmailSubmission {
        email: validate_email(field(raw, "email")),
        form_data: validate_survey_submission(field(raw, "formData")),
    }
}
