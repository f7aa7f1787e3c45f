//! Timestamp and enum column helpers.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text so lexical order in
//! SQLite matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use std::str::FromStr;

use storesync_core::errors::{Error, Result, ValidationError};

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub fn parse_optional_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(parse_timestamp).transpose()
}

/// Parses a text column into an enum, naming the column on failure.
pub fn parse_column<T>(column: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    value.parse::<T>().map_err(|_| {
        Error::Validation(ValidationError::InvalidInput(format!(
            "Invalid value '{}' in column {}",
            value, column
        )))
    })
}

/// Counters are unsigned in the domain and BIGINT in storage.
pub fn count_from_db(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
