//! Wall-clock "HH:MM" values used by every schedule computation.
//!
//! School hours never cross midnight, so arithmetic saturates at the day
//! boundaries (00:00 and 23:59) instead of wrapping around. Callers that need
//! to know whether saturation happened use [`TimeOfDay::checked_add_minutes`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::str::FromStr;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Error returned when a string is not a valid 24-hour "HH:MM" time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed time of day {input:?}, expected HH:MM")]
pub struct TimeParseError {
    pub input: String,
}

/// A minute of the day in `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const LAST_MINUTE: TimeOfDay = TimeOfDay(MINUTES_PER_DAY - 1);

    /// Builds a time from hour and minute, `None` when out of range.
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Parses a zero-padded (or single-digit hour) 24-hour "HH:MM" string.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::from)
            .map_err(|_| TimeParseError {
                input: s.to_string(),
            })
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

    /// Adds (or subtracts) minutes, `None` if the result leaves the day.
    pub fn checked_add_minutes(self, n: i32) -> Option<Self> {
        let total = i32::from(self.0).checked_add(n)?;
        u16::try_from(total).ok().and_then(Self::from_minutes)
    }

    /// Adds (or subtracts) minutes, clamping to 00:00..=23:59.
    pub fn add_minutes(self, n: i32) -> Self {
        let total = i32::from(self.0)
            .saturating_add(n)
            .clamp(0, i32::from(MINUTES_PER_DAY) - 1);
        Self(total as u16)
    }

    /// Resolves this time against a calendar date.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.into())
    }
}

/// `b - a` in minutes; negative when `b` is earlier than `a`.
pub fn minutes_between(a: TimeOfDay, b: TimeOfDay) -> i32 {
    i32::from(b.0) - i32::from(a.0)
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

impl From<TimeOfDay> for NaiveTime {
    fn from(t: TimeOfDay) -> Self {
        NaiveTime::from_hms_opt(u32::from(t.hour()), u32::from(t.minute()), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}
