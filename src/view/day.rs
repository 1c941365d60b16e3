use crate::clock::Now;
use crate::models::{CourseOccurrence, DayName, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseStatus {
    /// Finished, or on a day other than today.
    Past,
    Current,
    Upcoming,
}

impl CourseStatus {
    /// Current and upcoming courses are drawn the same way.
    pub fn is_highlighted(self) -> bool {
        matches!(self, Self::Current | Self::Upcoming)
    }

    fn of(course: &CourseOccurrence, day: DayName, now: Now) -> Self {
        if day != now.day {
            return Self::Past;
        }
        let now = now.minutes();
        if course.start.minutes() <= now && now < course.end.minutes() {
            Self::Current
        } else if now < course.start.minutes() {
            Self::Upcoming
        } else {
            Self::Past
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub course: CourseOccurrence,
    pub status: CourseStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub day: DayName,
    /// Index into `Schedule::days` after clamping.
    pub day_index: usize,
    pub entries: Vec<DayEntry>,
}

/// The courses of one day, earliest first.
///
/// `day_index` is clamped into the schedule's day list. Courses with equal
/// start times keep their source order. `None` only for a schedule without
/// days, which the loader never produces.
pub fn build(schedule: &Schedule, day_index: usize, now: Now) -> Option<DayView> {
    let day_index = day_index.min(schedule.days.len().saturating_sub(1));
    let day = *schedule.days.get(day_index)?;

    let mut courses: Vec<&CourseOccurrence> = schedule.courses_on(day).collect();
    courses.sort_by_key(|c| c.start);

    let entries = courses
        .into_iter()
        .map(|course| DayEntry {
            status: CourseStatus::of(course, day, now),
            course: course.clone(),
        })
        .collect();

    Some(DayView {
        day,
        day_index,
        entries,
    })
}
