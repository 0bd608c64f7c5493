//! Conversions between epoch seconds and the UTC strings used on the CLI and
//! in output files.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Layout of the `datetime` column in output files.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Unrecognised datetime {0:?} (expected RFC 3339, \"YYYY-MM-DD HH:MM:SS\" or \"YYYY-MM-DD\")")]
    Unrecognised(String),

    #[error("Epoch timestamp {0} is out of range")]
    OutOfRange(i64),
}

/// Formats epoch seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn unix_to_datetime_string(unix: i64) -> Result<String, TimeParseError> {
    DateTime::from_timestamp(unix, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .ok_or(TimeParseError::OutOfRange(unix))
}

/// Parses a UTC datetime from RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_utc_datetime(input: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimeParseError::Unrecognised(input.to_string()))
}

/// Epoch seconds of a datetime in any layout [`parse_utc_datetime`] accepts.
pub fn datetime_string_to_unix(input: &str) -> Result<i64, TimeParseError> {
    parse_utc_datetime(input).map(|dt| dt.timestamp())
}
