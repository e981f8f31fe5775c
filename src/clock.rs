//! Time source and date stamp formatting.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{MealError, Result};

/// Format of stored date stamps, brackets included.
pub const STAMP_FORMAT: &str = "[%Y-%m-%d]";

/// Format accepted from `--date`.
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Supplies "now" to pruning, timestamping, and recency checks.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today_stamp(&self) -> String {
        self.now().format(STAMP_FORMAT).to_string()
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Noon on the given day.
    pub fn on(date: NaiveDate) -> Self {
        FixedClock(date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Render a date as a stored stamp, e.g. `[2024-05-01]`.
pub fn stamp(date: NaiveDate) -> String {
    date.format(STAMP_FORMAT).to_string()
}

/// Parse a stored stamp into midnight of its day.
pub fn parse_stamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(value, STAMP_FORMAT)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Validate user input `YYYY-MM-DD` and re-render it as a stored stamp.
pub fn parse_input_date(value: &str) -> Result<String> {
    NaiveDate::parse_from_str(value.trim(), INPUT_DATE_FORMAT)
        .map(stamp)
        .map_err(|_| MealError::InvalidDate(value.to_string()))
}
