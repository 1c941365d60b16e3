use chrono::{Datelike, Local};

use crate::error::ScheduleError;
use crate::models::DayName;
use crate::time::ClockTime;

/// A wall-clock reading: the local day of week and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    pub day: DayName,
    pub time: ClockTime,
}

impl Now {
    pub fn new(day: DayName, time: ClockTime) -> Self {
        Self { day, time }
    }

    pub fn minutes(&self) -> u16 {
        self.time.minutes()
    }
}

pub trait Clock {
    fn now(&self) -> Now;
}

/// Reads the local time zone via chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Now {
        let local = Local::now();
        Now {
            day: local.weekday().into(),
            time: local.time().into(),
        }
    }
}

/// A clock stuck at one instant, for `--at` and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Now);

impl FixedClock {
    /// Parses `"<Day> <HH:MM AM>"`, e.g. `"Monday 09:30 AM"`.
    pub fn parse(input: &str) -> Result<Self, ScheduleError> {
        let (day, time) = input
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| ScheduleError::Malformed {
                message: format!("expected \"<Day> <HH:MM AM>\", got {input:?}"),
            })?;
        Ok(Self(Now {
            day: day.parse()?,
            time: time.parse()?,
        }))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Now {
        self.0
    }
}
