use thiserror::Error;

use crate::models::DayName;
use crate::time::ClockTime;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Errors raised while loading or looking up schedules.
///
/// Parse failures are only ever produced at load time; once a schedule is in
/// the store every view over it is infallible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Schedule not found: {id}")]
    NotFound { id: String },

    #[error("Invalid clock time {input:?}: {reason}")]
    InvalidTime { input: String, reason: &'static str },

    #[error("Invalid day name {input:?}")]
    InvalidDay { input: String },

    #[error("Duplicate schedule id: {id}")]
    DuplicateId { id: String },

    #[error("Malformed schedule: {message}")]
    Malformed { message: String },
}

impl ScheduleError {
    pub(crate) fn invalid_time(input: &str, reason: &'static str) -> Self {
        Self::InvalidTime {
            input: input.to_string(),
            reason,
        }
    }
}

// ─── Data hazards ────────────────────────────────────────────────────────────

/// A course the grid could not place. Resolution is lossy: the first course
/// in source order keeps the cell, the hazard records what was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataHazard {
    /// Another course of the same day already starts at this boundary.
    DuplicateStart {
        day: DayName,
        start: ClockTime,
        title: String,
    },
    /// The course starts inside a cell spanned by an earlier course.
    Shadowed {
        day: DayName,
        start: ClockTime,
        title: String,
    },
}

impl DataHazard {
    pub fn title(&self) -> &str {
        match self {
            Self::DuplicateStart { title, .. } | Self::Shadowed { title, .. } => title,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::DuplicateStart { day, start, title } => {
                format!("{title} ({day} {start}) duplicates another course's start; dropped")
            }
            Self::Shadowed { day, start, title } => {
                format!("{title} ({day} {start}) starts inside another course; dropped")
            }
        }
    }
}
