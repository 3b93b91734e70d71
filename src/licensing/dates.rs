//! Date arithmetic for license validity windows.
//!
//! All values are Unix seconds in UTC. Day counts are calendar-day
//! differences with the time of day truncated.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, Result};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Wire format accepted for renewal dates.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Midnight (UTC) of the day containing `ts`.
pub fn start_of_day(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECONDS_PER_DAY)
}

pub fn add_days(ts: i64, days: i32) -> i64 {
    ts + i64::from(days) * SECONDS_PER_DAY
}

/// Whole calendar days from `from` to `to`, ignoring time of day.
pub fn days_between(from: i64, to: i64) -> i64 {
    (start_of_day(to) - start_of_day(from)) / SECONDS_PER_DAY
}

/// Parse a renewal date in `YYYY-MM-DDTHH:MM:SS` form.
pub fn parse_expiration(raw: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(raw.trim(), EXPIRATION_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| {
            AppError::InvalidFormat(format!(
                "expected date as YYYY-MM-DDTHH:MM:SS, got '{}'",
                raw
            ))
        })
}

/// Render a timestamp in the renewal wire format, for messages and logs.
pub fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format(EXPIRATION_FORMAT).to_string())
        .unwrap_or_else(|| ts.to_string())
}
