//! Wall-clock date and time-of-day handling.
//!
//! All clinic times are naive local values; no timezone is attached or
//! converted anywhere in the scheduling core.

use chrono::{Datelike, NaiveDate, NaiveTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
const TIME_FORMAT_SECONDS: &str = "%H:%M:%S";

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Accepts `HH:MM` and the `HH:MM:SS` form Postgres returns for `time` columns.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, TIME_FORMAT_SECONDS))
        .map_err(|_| format!("Invalid time '{}', expected HH:MM", raw))
}

pub fn format_time_of_day(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Sunday-based day of week, 0 = Sunday through 6 = Saturday.
pub fn day_of_week(date: &NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// Serde adapter rendering `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time_of_day(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
