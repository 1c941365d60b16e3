use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::ScheduleError;
use crate::models::Schedule;

// ─── Embedded fixtures ──────────────────────────────────────────────────────

const BUILTIN: &[(&str, &str)] = &[
    (
        "ioa-bsa-1-1stsem-year-1.json",
        include_str!("../data/schedules/ioa-bsa-1-1stsem-year-1.json"),
    ),
    (
        "bsba-mm-1-c-1stsem-year-1.json",
        include_str!("../data/schedules/bsba-mm-1-c-1stsem-year-1.json"),
    ),
];

// ─── Store ──────────────────────────────────────────────────────────────────

/// In-memory list of schedules, in listing order. Ids are unique.
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    schedules: Vec<Schedule>,
}

impl ScheduleStore {
    pub fn new(schedules: Vec<Schedule>) -> Result<Self, ScheduleError> {
        let mut seen = HashSet::new();
        for schedule in &schedules {
            if !seen.insert(schedule.id.as_str()) {
                return Err(ScheduleError::DuplicateId {
                    id: schedule.id.clone(),
                });
            }
            warn_inverted_courses(schedule);
        }
        Ok(Self { schedules })
    }

    /// The schedules compiled into the binary.
    pub fn builtin() -> Result<Self, ScheduleError> {
        let schedules = BUILTIN
            .iter()
            .map(|(source, body)| parse_schedule(source, body))
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = schedules.len(), "loaded built-in schedules");
        Self::new(schedules)
    }

    pub fn list(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn first(&self) -> Option<&Schedule> {
        self.schedules.first()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schedules.iter().any(|s| s.id == id)
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Schedule, ScheduleError> {
        self.schedules
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ScheduleError::NotFound { id: id.to_string() })
    }

    /// Schedules whose names contain `term`, case-insensitively, in listing
    /// order. A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Schedule> {
        let term = term.trim();
        self.schedules.iter().filter(|s| s.matches(term)).collect()
    }

    /// Replaces the schedule with the same id, or appends it. Returns `true`
    /// when an existing schedule was replaced.
    pub fn upsert(&mut self, schedule: Schedule) -> bool {
        warn_inverted_courses(&schedule);
        match self.schedules.iter_mut().find(|s| s.id == schedule.id) {
            Some(existing) => {
                *existing = schedule;
                true
            }
            None => {
                self.schedules.push(schedule);
                false
            }
        }
    }
}

/// Parses one schedule file. `source` only labels the error.
pub fn parse_schedule(source: &str, body: &str) -> Result<Schedule, ScheduleError> {
    serde_json::from_str(body).map_err(|e| ScheduleError::Malformed {
        message: format!("{source}: {e}"),
    })
}

fn warn_inverted_courses(schedule: &Schedule) {
    for course in schedule.courses.iter().filter(|c| c.start >= c.end) {
        warn!(
            schedule = %schedule.id,
            title = %course.title,
            day = %course.day,
            "course does not end after it starts: {}",
            course.time_range()
        );
    }
}
