use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A 12-hour wall-clock time such as `"09:30 AM"`.
///
/// Stored as minutes since midnight, so equality and ordering follow the
/// clock rather than the spelling (`"9:00 AM"` == `"09:00 AM"`). Always
/// formats in the canonical zero-padded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { minutes: 0 };

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self { minutes })
    }

    /// Parses `H:MM AM` / `HH:MM PM` (designator is case-insensitive).
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        to_minutes(input).map(|minutes| Self { minutes })
    }

    pub fn minutes(self) -> u16 {
        self.minutes
    }

    pub fn hour24(self) -> u16 {
        self.minutes / 60
    }

    pub fn minute(self) -> u16 {
        self.minutes % 60
    }
}

/// Minutes since midnight of a 12-hour clock string.
pub fn to_minutes(input: &str) -> Result<u16, ScheduleError> {
    let trimmed = input.trim();
    let (clock, meridiem) = trimmed
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| ScheduleError::invalid_time(input, "missing AM/PM designator"))?;

    let pm = match meridiem.to_ascii_uppercase().as_str() {
        "AM" => false,
        "PM" => true,
        _ => return Err(ScheduleError::invalid_time(input, "missing AM/PM designator")),
    };

    let (hour, minute) = clock
        .trim_end()
        .split_once(':')
        .ok_or_else(|| ScheduleError::invalid_time(input, "expected HH:MM"))?;

    let hour = parse_digits(hour, 1..=2)
        .filter(|h| (1..=12).contains(h))
        .ok_or_else(|| ScheduleError::invalid_time(input, "hour must be between 1 and 12"))?;
    let minute = parse_digits(minute, 2..=2)
        .filter(|m| *m < 60)
        .ok_or_else(|| ScheduleError::invalid_time(input, "minute must be between 00 and 59"))?;

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    Ok(hour * 60 + minute)
}

fn parse_digits(s: &str, len: std::ops::RangeInclusive<usize>) -> Option<u16> {
    if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, meridiem) = match self.hour24() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        write!(f, "{hour:02}:{:02} {meridiem}", self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(t: NaiveTime) -> Self {
        Self::from_minutes((t.hour() * 60 + t.minute()) as u16).unwrap_or(Self::MIDNIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12:00 AM", 0)]
    #[case("12:30 AM", 30)]
    #[case("01:00 AM", 60)]
    #[case("11:59 AM", 719)]
    #[case("12:00 PM", 720)]
    #[case("01:30 PM", 810)]
    #[case("11:59 PM", 1439)]
    #[case("9:00 am", 540)]
    #[case("  06:00 PM ", 1080)]
    fn converts_to_minutes(#[case] input: &str, #[case] expected: u16) {
        assert_eq!(to_minutes(input).unwrap(), expected);
    }

    #[rstest]
    #[case("09:00")]
    #[case("09:00 XM")]
    #[case("13:00 PM")]
    #[case("00:30 AM")]
    #[case("09:60 AM")]
    #[case("09:5 AM")]
    #[case("9 AM")]
    #[case("ab:cd PM")]
    #[case("")]
    fn rejects_malformed_input(#[case] input: &str) {
        let err = to_minutes(input).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTime { .. }), "{err:?}");
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(ClockTime::parse("9:05 am").unwrap().to_string(), "09:05 AM");
        assert_eq!(ClockTime::MIDNIGHT.to_string(), "12:00 AM");
        assert_eq!(ClockTime::from_minutes(720).unwrap().to_string(), "12:00 PM");
        assert_eq!(ClockTime::from_minutes(1439).unwrap().to_string(), "11:59 PM");
        assert!(ClockTime::from_minutes(1440).is_none());
    }

    #[test]
    fn display_parses_back_for_every_minute() {
        for m in 0..MINUTES_PER_DAY {
            let t = ClockTime::from_minutes(m).unwrap();
            assert_eq!(ClockTime::parse(&t.to_string()).unwrap(), t);
        }
    }

    #[test]
    fn spelling_does_not_affect_equality() {
        assert_eq!(
            ClockTime::parse("9:00 AM").unwrap(),
            ClockTime::parse("09:00 AM").unwrap()
        );
        assert!(ClockTime::parse("11:00 AM").unwrap() < ClockTime::parse("01:00 PM").unwrap());
    }

    #[test]
    fn converts_from_chrono() {
        let naive = NaiveTime::from_hms_opt(15, 45, 59).unwrap();
        assert_eq!(ClockTime::from(naive), ClockTime::parse("03:45 PM").unwrap());
        assert_eq!(ClockTime::from(NaiveTime::MIN), ClockTime::MIDNIGHT);
    }

    #[test]
    fn serde_uses_canonical_strings() {
        let t: ClockTime = serde_json::from_str("\"1:30 pm\"").unwrap();
        assert_eq!(t.minutes(), 810);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"01:30 PM\"");
        assert!(serde_json::from_str::<ClockTime>("\"25:00 PM\"").is_err());
    }
}
