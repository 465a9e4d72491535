//! Centralized datetime handling utilities
//!
//! Timestamps are stored as RFC3339 text with second precision and a `Z`
//! suffix so that lexical ordering in SQLite matches chronological ordering.
//! History points use calendar dates in `YYYY-MM-DD` form.
//!
//! # Usage
//!
//! ```rust
//! use tubestats::utils::datetime::DateTimeParser;
//!
//! let published = DateTimeParser::parse_flexible("2024-03-01T17:00:04Z").unwrap();
//! assert_eq!(DateTimeParser::format_for_storage(&published), "2024-03-01T17:00:04Z");
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Format of calendar dates used for history points and publication markers
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur during datetime operations
#[derive(Error, Debug)]
pub enum DateTimeError {
    /// Invalid datetime format provided
    #[error("Invalid datetime format: '{input}' - expected RFC3339 (2023-01-01T12:00:00Z) or SQLite (2023-01-01 12:00:00)")]
    InvalidFormat { input: String },

    /// Invalid calendar date provided
    #[error("Invalid date: '{input}' - expected YYYY-MM-DD")]
    InvalidDate { input: String },
}

/// Centralized datetime parsing and formatting utilities
pub struct DateTimeParser;

impl DateTimeParser {
    /// Parse datetime from the formats the YouTube API and SQLite produce
    ///
    /// Supports:
    /// - RFC3339 with timezone: "2023-01-01T12:00:00Z"
    /// - RFC3339 with offset: "2023-01-01T12:00:00+02:00"
    /// - SQLite format (assumes UTC): "2023-01-01 12:00:00"
    pub fn parse_flexible(datetime_str: &str) -> Result<DateTime<Utc>, DateTimeError> {
        let trimmed = datetime_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive_formats = [
            "%Y-%m-%d %H:%M:%S",    // SQLite format
            "%Y-%m-%d %H:%M:%S%.f", // SQLite with microseconds
            "%Y-%m-%dT%H:%M:%S",    // ISO without timezone
            "%Y-%m-%dT%H:%M:%S%.f", // ISO with microseconds
        ];

        for format in &naive_formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
            }
        }

        Err(DateTimeError::InvalidFormat {
            input: datetime_str.to_string(),
        })
    }

    /// Format datetime for storage in SQLite
    pub fn format_for_storage(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Parse a `YYYY-MM-DD` calendar date
    pub fn parse_date(date_str: &str) -> Result<NaiveDate, DateTimeError> {
        NaiveDate::parse_from_str(date_str.trim(), CALENDAR_DATE_FORMAT).map_err(|_| {
            DateTimeError::InvalidDate {
                input: date_str.to_string(),
            }
        })
    }

    /// Format a calendar date as `YYYY-MM-DD`
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(CALENDAR_DATE_FORMAT).to_string()
    }
}

/// Serde helpers for `NaiveDate` fields stored as `YYYY-MM-DD`
pub mod calendar_date {
    use super::DateTimeParser;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&DateTimeParser::format_date(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTimeParser::parse_date(&s).map_err(serde::de::Error::custom)
    }
}
