//! Date parsing for daily note arguments.
//!
//! Accepts ISO dates and natural language via chrono-english:
//!
//! - **Relative**: `"today"`, `"yesterday"`, `"3 days ago"`
//! - **Named days**: `"last friday"`, `"this wednesday"`
//! - **ISO 8601**: `"2024-01-15"`

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use chrono_english::{Dialect, parse_date_string};

use crate::error::{NotehubError, Result};

/// Parse a date relative to the local current time.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    parse_date_at(date_str, Local::now().naive_local())
}

/// Parse a date relative to `now`.
pub fn parse_date_at(date_str: &str, now: NaiveDateTime) -> Result<NaiveDate> {
    let date_str = date_str.trim();

    // Exact dates first
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }

    let invalid = || NotehubError::InvalidDateFormat(date_str.to_string());
    let now = Local
        .from_local_datetime(&now)
        .earliest()
        .ok_or_else(invalid)?;

    parse_date_string(date_str, now, Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|_| invalid())
}

/// File stem of the daily note for `date`.
pub fn date_stem(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
