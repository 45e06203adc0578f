//! Calendar date carried by a task.

use super::TaskDomainError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// `strftime` pattern of the wire format.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of a `YYYY-MM-DD` string.
const DATE_LEN: usize = 10;

/// Day on which a task becomes active.
///
/// Serializes as `YYYY-MM-DD`. Storage keeps the date as a timestamp at
/// midnight UTC; converting back discards the time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskDate(NaiveDate);

impl TaskDate {
    /// Wraps a calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Creates a date from year, month and day components.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidDate`] when the components do not
    /// name a real calendar day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, TaskDomainError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| TaskDomainError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// Parses the `YYYY-MM-DD` wire format.
    ///
    /// Only zero-padded four-digit years, two-digit months and two-digit days
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidDate`] for any other shape or for a
    /// date that does not exist.
    pub fn parse(value: &str) -> Result<Self, TaskDomainError> {
        if !has_date_shape(value) {
            return Err(TaskDomainError::InvalidDate(value.to_owned()));
        }
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Self)
            .map_err(|_| TaskDomainError::InvalidDate(value.to_owned()))
    }

    /// Recovers the date from a stored timestamp.
    #[must_use]
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.date_naive())
    }

    /// Returns the storage timestamp: midnight UTC of this date.
    #[must_use]
    pub fn to_timestamp(self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    /// Returns the wrapped calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// Returns `true` for Saturdays and Sundays.
    #[must_use]
    pub fn is_weekend(self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

fn has_date_shape(value: &str) -> bool {
    value.len() == DATE_LEN
        && value.bytes().enumerate().all(|(position, byte)| match position {
            4 | 7 => byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

impl FromStr for TaskDate {
    type Err = TaskDomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for TaskDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for TaskDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
