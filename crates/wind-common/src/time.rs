//! Local time handling for labels, generator inputs and query windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};

/// Display label of one timeline step, e.g. `("15/01/2024", "13:00")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLabel {
    pub date: String,
    pub time: String,
}

impl TimeLabel {
    pub fn from_naive(local: &NaiveDateTime) -> Self {
        Self {
            date: local.format("%d/%m/%Y").to_string(),
            time: local.format("%H:%M").to_string(),
        }
    }
}

impl std::fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

/// Fixed offset from UTC, in minutes.
///
/// Daylight saving is not modelled; NZST (+12h) is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalOffset {
    pub minutes: i32,
}

impl Default for LocalOffset {
    fn default() -> Self {
        Self::nzst()
    }
}

impl LocalOffset {
    pub fn from_minutes(minutes: i32) -> Self {
        Self { minutes }
    }

    pub fn from_hours(hours: i32) -> Self {
        Self {
            minutes: hours * 60,
        }
    }

    pub fn nzst() -> Self {
        Self::from_hours(12)
    }

    /// Wall-clock time at this offset for an epoch-millisecond instant.
    pub fn local_naive(&self, epoch_ms: i64) -> NaiveDateTime {
        let utc = DateTime::from_timestamp_millis(epoch_ms).unwrap_or_default();
        utc.naive_utc() + Duration::minutes(self.minutes as i64)
    }

    /// Local hour of day (0-23).
    pub fn hour(&self, epoch_ms: i64) -> u32 {
        self.local_naive(epoch_ms).hour()
    }

    /// Local month, 0-based (January = 0).
    pub fn month0(&self, epoch_ms: i64) -> u32 {
        self.local_naive(epoch_ms).month0()
    }

    pub fn local_date(&self, epoch_ms: i64) -> NaiveDate {
        self.local_naive(epoch_ms).date()
    }
}

/// Inclusive range of calendar days used for historical queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days` days leading up to and including today.
    pub fn trailing(now_ms: i64, days: u32, offset: LocalOffset) -> Self {
        let end = offset.local_date(now_ms);
        let start = end - Duration::days(days as i64);
        Self { start, end }
    }

    /// `YYYY-MM-DD`, as expected by the provider query string.
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Parse a provider local timestamp such as `2024-01-15T13:00`.
///
/// Returns the instant (using the provider's reported UTC offset in seconds)
/// and the display label taken from the local wall-clock time.
pub fn parse_provider_local(s: &str, utc_offset_seconds: i64) -> WindResult<(i64, TimeLabel)> {
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| WindError::ParseError(format!("Invalid local time: {}", s)))?;

    let utc = local - Duration::seconds(utc_offset_seconds);
    Ok((utc.and_utc().timestamp_millis(), TimeLabel::from_naive(&local)))
}
