//! Lenient parsing of the string fields clients send for dates, times and ids.
//!
//! Request bodies keep these fields as `Option<String>` so that an absent or
//! malformed field is reported as a validation failure naming the field,
//! instead of a generic deserialization rejection.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    Missing(String),

    #[error("invalid {field}: '{value}'")]
    Invalid { field: String, value: String },
}

impl InputError {
    fn invalid(field: &str, value: &str) -> Self {
        InputError::Invalid {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Returns the trimmed value, treating `None` and blank strings as missing.
pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, InputError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(InputError::Missing(field.to_string())),
    }
}

pub fn parse_uuid(value: Option<&str>, field: &str) -> Result<Uuid, InputError> {
    let raw = required(value, field)?;
    Uuid::parse_str(raw).map_err(|_| InputError::invalid(field, raw))
}

/// Accepts `YYYY-MM-DD`, an ISO timestamp (the date part is kept) and the
/// day-first `DD/MM/YYYY` form.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, InputError> {
    let raw = required(value, field)?;
    let date_part = raw.split('T').next().unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(|_| InputError::invalid(field, raw))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(value: Option<&str>, field: &str) -> Result<NaiveTime, InputError> {
    let raw = required(value, field)?;

    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| InputError::invalid(field, raw))
}
