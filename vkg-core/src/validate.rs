//! Field validators.
//!
//! Each validator checks one declared value and attributes any failure to
//! the attribute path it was given.

use chrono::{NaiveDateTime, Timelike};
use serde_json::Value;

use crate::error::ValidationError;

/// Wall-clock format accepted for `start` and `end`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn string(value: &Value, attribute: &str) -> Result<(), ValidationError> {
    expect_str(value, attribute).map(|_| ())
}

/// Parse exactly `YYYY-MM-DD HH:MM:SS`.
///
/// chrono alone lets a space match any run of whitespace and accepts
/// unpadded fields, a sign and leap seconds; only the zero-padded form that
/// formats back to the same string is accepted here.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    let parsed = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map_err(|e| e.to_string())?;

    if parsed.nanosecond() != 0 {
        return Err("leap seconds are not supported".to_string());
    }
    if parsed.format(DATETIME_FORMAT).to_string() != s {
        return Err("fields must be zero-padded and separated by a single space".to_string());
    }

    Ok(parsed)
}

/// Accepts a `YYYY-MM-DD HH:MM:SS` string.
pub fn datetime(value: &Value, attribute: &str) -> Result<NaiveDateTime, ValidationError> {
    let s = expect_str(value, attribute)?;

    parse_datetime(s).map_err(|e| {
        ValidationError::new(
            attribute,
            format!("cannot parse {s:?} as YYYY-MM-DD HH:MM:SS: {e}"),
        )
    })
}

/// Accepts a string that is exactly one of `allowed` (case-sensitive).
pub fn one_of(value: &Value, attribute: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    let s = expect_str(value, attribute)?;

    if allowed.contains(&s) {
        Ok(())
    } else {
        Err(ValidationError::new(
            attribute,
            format!("expected {attribute} to be one of {allowed:?}, got {s:?}"),
        ))
    }
}

pub fn boolean(value: &Value, attribute: &str) -> Result<(), ValidationError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(type_error(attribute, "bool"))
    }
}

fn expect_str<'a>(value: &'a Value, attribute: &str) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| type_error(attribute, "string"))
}

pub(crate) fn type_error(attribute: &str, expected: &str) -> ValidationError {
    ValidationError::new(
        attribute,
        format!("expected type of {attribute} to be {expected}"),
    )
}
