//! Shared helpers for form cleaning and field-level errors

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Field name to the list of messages shown next to that field
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";

/// Outcome of a submitted form: either the cleaned value or the errors to redisplay
#[derive(Debug)]
pub enum Submission<T> {
    Accepted(T),
    Rejected(FieldErrors),
}

pub fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Flatten validator derive output into field errors
pub fn collect_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            add_error(&mut out, &field.to_string(), message);
        }
    }
    out
}

/// Accept any JSON value for a text field so the form can report it.
/// `null` is no value, strings pass through, anything else keeps its JSON text.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Blank means "no date"; anything else must parse
pub fn clean_optional_date(
    field: &str,
    raw: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    match raw.map(str::trim) {
        None | Some("") => None,
        Some(value) => {
            let parsed = parse_date(value);
            if parsed.is_none() {
                add_error(errors, field, INVALID_DATE);
            }
            parsed
        }
    }
}
