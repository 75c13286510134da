//! Schedule time handling for GTFS stop times.
//!
//! GTFS stop times are "HH:MM:SS" strings measured from noon minus twelve
//! hours on the service day. Services that run past midnight carry hours of
//! 24 or more ("25:10:00"), so these values are not wall-clock times and
//! cannot be stored in a `NaiveTime`.

use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Error returned when parsing an invalid schedule time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schedule time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Latest hour accepted in a stop time. Real feeds stay well below this.
const MAX_HOUR: u32 = 47;

/// A scheduled time of day, in seconds since the start of the service day.
///
/// Ordering is plain numeric ordering, so "24:30:00" sorts after "23:59:59".
///
/// # Examples
///
/// ```
/// use journeytime_server::domain::ScheduleTime;
///
/// let t = ScheduleTime::parse("16:44:03").unwrap();
/// assert_eq!(t.to_string(), "16:44:03");
///
/// // After-midnight service times are allowed
/// assert!(ScheduleTime::parse("25:10:00").is_ok());
///
/// // Malformed input is rejected
/// assert!(ScheduleTime::parse("16:44").is_err());
/// assert!(ScheduleTime::parse("16:60:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleTime(u32);

impl ScheduleTime {
    /// Build from hours, minutes and seconds.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, TimeError> {
        if hour > MAX_HOUR {
            return Err(TimeError::new("hour out of range"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }
        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Parse "HH:MM:SS". A single-digit hour ("7:05:00") is accepted since
    /// several feeds publish it that way.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let mut parts = s.split(':');

        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        if h.is_empty() || h.len() > 2 {
            return Err(TimeError::new("invalid hour digits"));
        }
        let hour = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        let second = parse_two_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;

        Self::from_hms(hour, minute, second)
    }

    /// The wall-clock time of day as a schedule time on the same service day.
    pub fn from_time_of_day(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Seconds since the start of the service day.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    pub fn minute(&self) -> u32 {
        (self.0 % 3600) / 60
    }

    pub fn second(&self) -> u32 {
        self.0 % 60
    }
}

impl fmt::Debug for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScheduleTime({self})")
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    parse_digits(s)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display then parse returns the same time
        #[test]
        fn display_roundtrip(h in 0u32..=MAX_HOUR, m in 0u32..60, s in 0u32..60) {
            let t = ScheduleTime::from_hms(h, m, s).unwrap();
            prop_assert_eq!(ScheduleTime::parse(&t.to_string()).unwrap(), t);
        }

        /// Ordering agrees with lexicographic (h, m, s) ordering
        #[test]
        fn ordering_matches_components(
            a in (0u32..=MAX_HOUR, 0u32..60, 0u32..60),
            b in (0u32..=MAX_HOUR, 0u32..60, 0u32..60),
        ) {
            let ta = ScheduleTime::from_hms(a.0, a.1, a.2).unwrap();
            let tb = ScheduleTime::from_hms(b.0, b.1, b.2).unwrap();
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        }
    }
}
