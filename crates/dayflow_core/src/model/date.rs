//! Calendar keys used as the canonical date representation.
//!
//! # Responsibility
//! - Validate fixed-width `YYYY-MM-DD` and `YYYY-MM` strings.
//! - Provide calendar helpers (today, next day, days of a month) on top of
//!   `chrono`.
//!
//! # Invariants
//! - Keys are zero-padded and fixed-width, so string order is chronological
//!   order. All comparisons (eviction minimum, history sort, view filters)
//!   compare the string form.
//! - A `DateKey` string always starts with its `MonthKey` string.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";
/// `%Y` widens past four digits after this year.
const MAX_YEAR: i32 = 9999;

static DATE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date key regex"));
static MONTH_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("valid month key regex"));

/// Date/month key validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    InvalidDate(String),
    InvalidMonth(String),
    /// Year outside `0000..=9999`, which has no fixed-width key.
    OutOfRange(String),
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::InvalidMonth(value) => write!(f, "invalid month `{value}`; expected YYYY-MM"),
            Self::OutOfRange(value) => write!(f, "date `{value}` is outside years 0000-9999"),
        }
    }
}

impl Error for DateError {}

/// Calendar day in `YYYY-MM-DD` form.
///
/// Field order matters: derived ordering compares `key` first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey {
    key: String,
    date: NaiveDate,
}

impl DateKey {
    /// Parses a strict `YYYY-MM-DD` string (surrounding whitespace ignored).
    pub fn parse(value: &str) -> Result<Self, DateError> {
        let trimmed = value.trim();
        if !DATE_KEY_RE.is_match(trimmed) {
            return Err(DateError::InvalidDate(trimmed.to_string()));
        }
        let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map_err(|_| DateError::InvalidDate(trimmed.to_string()))?;
        Ok(Self {
            key: trimmed.to_string(),
            date,
        })
    }

    /// Current local calendar day, clamped to the last keyable day.
    pub fn today() -> Self {
        Self::from_naive(Local::now().date_naive()).unwrap_or_else(|_| Self::last())
    }

    /// # Errors
    /// - `DateError::OutOfRange` for years outside `0000..=9999`.
    pub fn from_naive(date: NaiveDate) -> Result<Self, DateError> {
        if !(0..=MAX_YEAR).contains(&date.year()) {
            return Err(DateError::OutOfRange(date.to_string()));
        }
        Ok(Self::keyed(date))
    }

    /// Caller guarantees the year is in key range.
    fn keyed(date: NaiveDate) -> Self {
        Self {
            key: date.format(DATE_FORMAT).to_string(),
            date,
        }
    }

    fn last() -> Self {
        Self::keyed(NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MIN))
    }

    pub fn as_str(&self) -> &str {
        self.key.as_str()
    }

    pub fn naive(&self) -> NaiveDate {
        self.date
    }

    /// Returns the `YYYY-MM` prefix of this date.
    pub fn month(&self) -> MonthKey {
        MonthKey::of(self)
    }

    /// Returns the next calendar day; `9999-12-31` is its own successor.
    pub fn succ(&self) -> Self {
        self.date
            .succ_opt()
            .and_then(|next| Self::from_naive(next).ok())
            .unwrap_or_else(|| self.clone())
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.key
    }
}

/// Calendar month in `YYYY-MM` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    key: String,
    first_day: NaiveDate,
}

impl MonthKey {
    /// Parses a strict `YYYY-MM` string.
    pub fn parse(value: &str) -> Result<Self, DateError> {
        let trimmed = value.trim();
        let invalid = || DateError::InvalidMonth(trimmed.to_string());
        let caps = MONTH_KEY_RE.captures(trimmed).ok_or_else(invalid)?;
        let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
        let month = caps[2].parse::<u32>().map_err(|_| invalid())?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self {
            key: trimmed.to_string(),
            first_day,
        })
    }

    pub fn of(date: &DateKey) -> Self {
        let naive = date.naive();
        let first_day = naive.with_day(1).unwrap_or(naive);
        Self {
            key: date.as_str()[..7].to_string(),
            first_day,
        }
    }

    pub fn as_str(&self) -> &str {
        self.key.as_str()
    }

    pub fn first_day(&self) -> DateKey {
        DateKey::keyed(self.first_day)
    }

    /// Returns `true` when `date` starts with this month's prefix.
    pub fn contains(&self, date: &DateKey) -> bool {
        date.as_str().starts_with(self.key.as_str())
    }

    /// Returns every calendar day of the month in ascending order.
    pub fn days(&self) -> Vec<DateKey> {
        let month = self.first_day.month();
        self.first_day
            .iter_days()
            .take_while(|day| day.month() == month)
            .map(DateKey::keyed)
            .collect()
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.key
    }
}
