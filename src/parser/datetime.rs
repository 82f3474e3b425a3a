//! Timestamp normalization
//!
//! Payload dates arrive in several ISO-8601 flavours. Every value is
//! normalized to a UTC-naive [`NaiveDateTime`]: if an offset is present the
//! instant is converted to UTC and the offset dropped.
//!
//! Offset-aware patterns are tried before offset-naive ones. Trying the
//! naive ones first would let a value like `2024-03-05T10:00:00+02:00` be
//! read as 10:00 local with the offset silently ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::utils::error::ParseError;

/// Patterns carrying an explicit offset, tried first
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Offset-naive patterns
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Relaxed ISO-8601 shapes accepted by the last-resort pass
const RELAXED_NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp string into a UTC-naive instant
///
/// # Errors
///
/// Returns [`ParseError::UnsupportedDatetime`] when no supported format
/// matches.
pub fn normalize_datetime(value: &str) -> Result<NaiveDateTime, ParseError> {
    let value = value.trim();

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt.naive_utc());
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }

    parse_relaxed(value).ok_or_else(|| ParseError::UnsupportedDatetime(value.to_string()))
}

/// Permissive ISO-8601 pass; a trailing `Z` means UTC
fn parse_relaxed(value: &str) -> Option<NaiveDateTime> {
    let zulu = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .map(|rest| format!("{rest}+00:00"));
    let candidate = zulu.as_deref().unwrap_or(value);

    if let Ok(dt) = DateTime::parse_from_rfc3339(candidate) {
        return Some(dt.naive_utc());
    }
    // RFC 3339 requires seconds; accept minute precision with an offset too
    if let Ok(dt) = DateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.naive_utc());
    }

    for fmt in RELAXED_NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(candidate, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(candidate, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// ISO-8601 representation keeping sub-second precision when present
///
/// Feeding this back into [`normalize_datetime`] yields the same instant.
pub fn to_iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Second-precision ISO-8601 representation used for storage
///
/// Fixed width, so lexicographic order equals chronological order.
pub fn to_iso_seconds(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}
