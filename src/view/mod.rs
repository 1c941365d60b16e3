//! Declarative render models.
//!
//! Everything here is a pure function of the store, the selection and the
//! wall clock. The terminal adapter in `tui::ui` only draws what it is given.

pub mod day;
pub mod grid;

use crate::clock::Now;
use crate::models::{DayName, Schedule};
use crate::store::ScheduleStore;

use day::DayView;
use grid::{BoundaryPolicy, Grid};

pub const NO_SCHEDULES: &str = "No schedules available.";
pub const NOT_FOUND: &str = "Schedule not found.";
pub const NO_SELECTION: &str = "No schedule selected.";

// ─── Selection ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// One day at a time, as cards.
    #[default]
    Simplified,
    /// The whole week as a grid.
    Table,
}

impl Mode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Simplified => Self::Table,
            Self::Table => Self::Simplified,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Simplified => "SIMPLE MODE",
            Self::Table => "TABLE MODE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub schedule_id: Option<String>,
    /// Only meaningful in [`Mode::Simplified`].
    pub day_index: usize,
    pub mode: Mode,
}

/// Today's position in the schedule's day list, or the first day.
pub fn default_day_index(schedule: &Schedule, today: DayName) -> usize {
    schedule.day_index(today).unwrap_or(0)
}

// ─── Render model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub subtitle: String,
    pub short_id: String,
}

impl Header {
    fn of(schedule: &Schedule) -> Self {
        Self {
            title: schedule.display_name.clone(),
            subtitle: schedule.subtitle.clone(),
            short_id: schedule.short_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTab {
    pub day: DayName,
    pub is_selected: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderModel {
    /// Nothing to draw but a message; no header, no day selector.
    Unavailable { message: &'static str },
    Simplified {
        header: Header,
        tabs: Vec<DayTab>,
        view: DayView,
    },
    Table {
        header: Header,
        grid: Grid,
    },
}

/// Recomputes the whole screen from scratch.
pub fn compose(
    store: &ScheduleStore,
    selection: &Selection,
    now: Now,
    policy: BoundaryPolicy,
) -> RenderModel {
    let Some(id) = selection.schedule_id.as_deref() else {
        let message = if store.is_empty() {
            NO_SCHEDULES
        } else {
            NO_SELECTION
        };
        return RenderModel::Unavailable { message };
    };
    let Ok(schedule) = store.find_by_id(id) else {
        return RenderModel::Unavailable { message: NOT_FOUND };
    };

    match selection.mode {
        Mode::Simplified => {
            let Some(view) = day::build(schedule, selection.day_index, now) else {
                return RenderModel::Unavailable { message: NOT_FOUND };
            };
            let tabs = schedule
                .days
                .iter()
                .enumerate()
                .map(|(i, day)| DayTab {
                    day: *day,
                    is_selected: i == view.day_index,
                    is_today: *day == now.day,
                })
                .collect();
            RenderModel::Simplified {
                header: Header::of(schedule),
                tabs,
                view,
            }
        }
        Mode::Table => RenderModel::Table {
            header: Header::of(schedule),
            grid: grid::build(schedule, now, policy),
        },
    }
}
