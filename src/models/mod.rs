use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;
use crate::time::ClockTime;

// ─── Days ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    pub const ALL: [DayName; 7] = [
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
        DayName::Saturday,
        DayName::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    pub fn abbrev(self) -> &'static str {
        &self.name()[..3]
    }
}

impl fmt::Display for DayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayName {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ScheduleError::InvalidDay {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for DayName {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayName> for String {
    fn from(value: DayName) -> Self {
        value.name().to_string()
    }
}

impl From<Weekday> for DayName {
    fn from(w: Weekday) -> Self {
        match w {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

// ─── Courses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOccurrence {
    pub day: DayName,
    pub start: ClockTime,
    pub end: ClockTime,
    pub title: String,
    pub room: String,
}

impl CourseOccurrence {
    /// `"09:00 AM - 10:30 AM"`
    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start, self.end)
    }
}

// ─── Schedules ──────────────────────────────────────────────────────────────

/// One section's weekly timetable.
///
/// Deserialization goes through [`RawSchedule`] so that a schedule that made
/// it into memory has a non-empty id and a non-empty, duplicate-free day list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct Schedule {
    pub id: String,
    /// Long name, only used for searching.
    pub name: String,
    pub display_name: String,
    pub subtitle: String,
    pub short_id: String,
    /// Column order of the weekly table.
    pub days: Vec<DayName>,
    pub courses: Vec<CourseOccurrence>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSchedule {
    id: String,
    #[serde(default)]
    name: String,
    display_name: String,
    #[serde(default)]
    subtitle: String,
    short_id: String,
    days: Vec<DayName>,
    #[serde(default)]
    courses: Vec<CourseOccurrence>,
}

impl TryFrom<RawSchedule> for Schedule {
    type Error = ScheduleError;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err(ScheduleError::Malformed {
                message: "schedule id must not be empty".into(),
            });
        }
        if raw.days.is_empty() {
            return Err(ScheduleError::Malformed {
                message: format!("schedule {} lists no days", raw.id),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = raw.days.iter().find(|d| !seen.insert(**d)) {
            return Err(ScheduleError::Malformed {
                message: format!("schedule {} lists {dup} twice", raw.id),
            });
        }

        Ok(Self {
            id: raw.id,
            name: raw.name,
            display_name: raw.display_name,
            subtitle: raw.subtitle,
            short_id: raw.short_id,
            days: raw.days,
            courses: raw.courses,
        })
    }
}

impl Schedule {
    pub fn day_index(&self, day: DayName) -> Option<usize> {
        self.days.iter().position(|d| *d == day)
    }

    pub fn courses_on(&self, day: DayName) -> impl Iterator<Item = &CourseOccurrence> {
        self.courses.iter().filter(move |c| c.day == day)
    }

    /// Case-insensitive substring match over every human-facing name.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [&self.name, &self.display_name, &self.subtitle, &self.short_id]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}
