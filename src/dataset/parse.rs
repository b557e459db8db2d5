//! Lenient cell parsing.
//!
//! Cells that cannot be parsed become `None` instead of failing the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Spellings of missing or non-finite values that load as null.
const NULL_MARKERS: &[&str] = &[
    "nan", "null", "none", "na", "inf", "+inf", "-inf", "infinity", "-infinity",
];

/// Deserialize an optional cell, mapping empty or unparseable text to `None`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_number(&s)))
}

/// Deserialize an optional date cell; see [`parse_date`].
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_date(&s)))
}

/// Parse a number, tolerating surrounding whitespace and a trailing `.0`
/// on integer columns, which is how integer columns with gaps get written.
pub fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_null_marker(trimmed) {
        return None;
    }

    trimmed.parse().ok().or_else(|| {
        trimmed
            .strip_suffix(".0")
            .and_then(|integral| integral.parse().ok())
    })
}

fn is_null_marker(raw: &str) -> bool {
    NULL_MARKERS
        .iter()
        .any(|marker| raw.eq_ignore_ascii_case(marker))
}

/// Parse a calendar date from the formats the source tables use.
///
/// Timestamps keep only their date part. Anything unparseable is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}
