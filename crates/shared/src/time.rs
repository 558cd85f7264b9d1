//! Time-of-day values as printed on tee sheet tiles (`"10:03am"`) and the
//! inclusive range predicate used to decide which tiles are wanted.

use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MINUTES_PER_DAY: u16 = 24 * 60;

const TIME_BANK_FIRST: u16 = 6 * 60;
const TIME_BANK_LAST: u16 = 15 * 60;
const TIME_BANK_STEP: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTimeError {
    #[error("time '{0}' has no numeric hour")]
    MissingHour(String),
    #[error("time '{0}' has an invalid minute field")]
    InvalidMinute(String),
    #[error("time '{0}' is missing an am/pm suffix")]
    MissingMeridiem(String),
    #[error("time '{0}' has an hour outside 1-12")]
    HourOutOfRange(String),
    #[error("time '{0}' has minutes outside 0-59")]
    MinuteOutOfRange(String),
}

/// Minutes since midnight, always in `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Parses `H[:MM]am|pm`, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, MalformedTimeError> {
        let lowered = raw.trim().to_ascii_lowercase();

        let (clock, is_pm) = if let Some(rest) = lowered.strip_suffix("pm") {
            (rest.trim_end(), true)
        } else if let Some(rest) = lowered.strip_suffix("am") {
            (rest.trim_end(), false)
        } else {
            return Err(MalformedTimeError::MissingMeridiem(raw.to_string()));
        };

        let (hour_part, minute_part) = match clock.split_once(':') {
            Some((hour, minute)) => (hour, Some(minute)),
            None => (clock, None),
        };

        let hour = ascii_digits(hour_part.trim(), 1..=2)
            .ok_or_else(|| MalformedTimeError::MissingHour(raw.to_string()))?;
        let minute = match minute_part {
            Some(minute) => ascii_digits(minute.trim(), 2..=2)
                .ok_or_else(|| MalformedTimeError::InvalidMinute(raw.to_string()))?,
            None => 0,
        };

        if !(1..=12).contains(&hour) {
            return Err(MalformedTimeError::HourOutOfRange(raw.to_string()));
        }
        if minute > 59 {
            return Err(MalformedTimeError::MinuteOutOfRange(raw.to_string()));
        }

        let hour = match (hour, is_pm) {
            (12, false) => 0,
            (12, true) => 12,
            (hour, true) => hour + 12,
            (hour, false) => hour,
        };

        Ok(Self(hour * 60 + minute))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

/// Plain ASCII digits only, so signs and odd widths are rejected.
fn ascii_digits(field: &str, width: RangeInclusive<usize>) -> Option<u16> {
    if !width.contains(&field.len()) || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.hour();
        let suffix = if hour < 12 { "am" } else { "pm" };
        let hour12 = match hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{hour12}:{:02}{suffix}", self.minute())
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = MalformedTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = MalformedTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Inclusive on both ends. An inverted range matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, MalformedTimeError> {
        Ok(Self::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?))
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Keeps the labels that parse and fall inside `range`, in input order.
pub fn filter_in_range<S: AsRef<str>>(candidates: &[S], range: &TimeRange) -> Vec<String> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|label| {
            TimeOfDay::parse(label)
                .map(|time| range.contains(time))
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect()
}

/// Every tee time the course can offer in a day: 6:00am to 3:00pm, nine
/// minutes apart.
pub fn time_bank() -> Vec<TimeOfDay> {
    (TIME_BANK_FIRST..=TIME_BANK_LAST)
        .step_by(TIME_BANK_STEP)
        .map(TimeOfDay)
        .collect()
}

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;
