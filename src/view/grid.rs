//! Weekly table layout.
//!
//! Turns a flat list of course occurrences into a time × day grid. Row
//! boundaries come from the course times themselves; a course covering
//! several rows is stored once as an anchor cell with a `row_span`, and the
//! cells it covers below are marked [`Cell::Merged`].
//!
//! Two courses can never occupy overlapping cells of one column. When the data
//! asks for it (two courses with the same day and start, or a course starting
//! inside another one) the first course in source order wins and the loser is
//! reported as a [`DataHazard`].

use serde::{Deserialize, Serialize};

use crate::clock::Now;
use crate::error::DataHazard;
use crate::models::{CourseOccurrence, DayName, Schedule};
use crate::time::ClockTime;

/// Which course times become row boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Start times plus the earliest time overall. A course whose end is not
    /// also some course's start collapses to a single row.
    #[default]
    StartTimes,
    /// Every distinct start and end time, so spans always reach the end.
    StartAndEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Anchor {
        course: CourseOccurrence,
        row_span: usize,
        /// Anchor sits in the current row of today's column.
        highlighted: bool,
    },
    /// Covered by an anchor above; renders nothing of its own.
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub day: DayName,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub time: ClockTime,
    pub is_current: bool,
    /// One cell per column, in column order.
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub columns: Vec<Column>,
    /// Never empty.
    pub rows: Vec<Row>,
    pub hazards: Vec<DataHazard>,
}

#[cfg(test)]
impl Grid {
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    pub fn anchors(&self) -> impl Iterator<Item = (usize, usize, &CourseOccurrence, usize)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.cells.iter().enumerate().filter_map(move |(c, cell)| match cell {
                Cell::Anchor {
                    course, row_span, ..
                } => Some((r, c, course, *row_span)),
                _ => None,
            })
        })
    }
}

/// Sorted row boundaries for `schedule`.
pub fn boundaries(schedule: &Schedule, policy: BoundaryPolicy) -> Vec<ClockTime> {
    let mut candidates: Vec<ClockTime> = schedule
        .courses
        .iter()
        .flat_map(|c| [c.start, c.end])
        .collect();
    candidates.sort();
    candidates.dedup();

    let mut rows: Vec<ClockTime> = candidates
        .iter()
        .enumerate()
        .filter(|(i, time)| {
            *i == 0
                || policy == BoundaryPolicy::StartAndEnd
                || schedule.courses.iter().any(|c| c.start == **time)
        })
        .map(|(_, time)| *time)
        .collect();

    if rows.is_empty() {
        rows.push(ClockTime::MIDNIGHT);
    }
    rows
}

/// Lays out `schedule` as a weekly grid, highlighting against `now`.
pub fn build(schedule: &Schedule, now: Now, policy: BoundaryPolicy) -> Grid {
    let times = boundaries(schedule, policy);
    let current = current_row(&times, now.time);

    let columns: Vec<Column> = schedule
        .days
        .iter()
        .map(|day| Column {
            day: *day,
            is_today: *day == now.day,
        })
        .collect();

    let mut cells = vec![vec![Cell::Empty; columns.len()]; times.len()];
    let mut hazards = Vec::new();

    for (col, column) in columns.iter().enumerate() {
        // Rows strictly below an anchor and before this index are merged.
        let mut covered_until = 0usize;

        for (row, time) in times.iter().enumerate() {
            let mut starting = schedule
                .courses_on(column.day)
                .filter(|c| c.start == *time);

            if row < covered_until {
                cells[row][col] = Cell::Merged;
                hazards.extend(starting.map(|c| DataHazard::Shadowed {
                    day: c.day,
                    start: c.start,
                    title: c.title.clone(),
                }));
                continue;
            }

            let Some(course) = starting.next() else {
                continue;
            };
            hazards.extend(starting.map(|c| DataHazard::DuplicateStart {
                day: c.day,
                start: c.start,
                title: c.title.clone(),
            }));

            let row_span = times
                .iter()
                .position(|t| *t == course.end)
                .filter(|end| *end > row)
                .map_or(1, |end| end - row)
                .min(times.len() - row);
            covered_until = row + row_span;

            cells[row][col] = Cell::Anchor {
                course: course.clone(),
                row_span,
                highlighted: current == Some(row) && column.is_today,
            };
        }
    }

    let rows = times
        .into_iter()
        .zip(cells)
        .enumerate()
        .map(|(i, (time, cells))| Row {
            time,
            is_current: current == Some(i),
            cells,
        })
        .collect();

    Grid {
        columns,
        rows,
        hazards,
    }
}

/// Courses the grid will drop for `schedule`, independent of the clock.
pub fn hazards(schedule: &Schedule, policy: BoundaryPolicy) -> Vec<DataHazard> {
    let any = Now::new(DayName::Monday, ClockTime::MIDNIGHT);
    build(schedule, any, policy).hazards
}

/// Index of the row whose interval `[time, next row)` contains `now`; the
/// last row runs to the end of the day.
fn current_row(times: &[ClockTime], now: ClockTime) -> Option<usize> {
    (0..times.len()).find(|&i| {
        let end = times.get(i + 1).map_or(u16::MAX, |t| t.minutes());
        times[i].minutes() <= now.minutes() && now.minutes() < end
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ScheduleStore;
    use rstest::rstest;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn course(day: DayName, start: &str, end: &str, title: &str) -> CourseOccurrence {
        CourseOccurrence {
            day,
            start: t(start),
            end: t(end),
            title: title.into(),
            room: "Room X".into(),
        }
    }

    fn schedule(days: &[DayName], courses: Vec<CourseOccurrence>) -> Schedule {
        Schedule {
            id: "test".into(),
            name: "Test".into(),
            display_name: "Test".into(),
            subtitle: String::new(),
            short_id: "T".into(),
            days: days.to_vec(),
            courses,
        }
    }

    fn sunday_night() -> Now {
        Now::new(DayName::Sunday, t("11:00 PM"))
    }

    const WEEKDAYS: [DayName; 5] = [
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
    ];

    #[test]
    fn zero_courses_still_has_one_row() {
        let grid = build(&schedule(&WEEKDAYS, vec![]), sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].time, ClockTime::MIDNIGHT);
        assert!(grid.rows[0].cells.iter().all(|c| *c == Cell::Empty));
        assert_eq!(grid.rows[0].cells.len(), 5);
    }

    #[test]
    fn span_covers_rows_up_to_end_boundary() {
        let s = schedule(
            &WEEKDAYS,
            vec![
                course(DayName::Monday, "09:00 AM", "12:00 PM", "LONG"),
                course(DayName::Tuesday, "10:30 AM", "12:00 PM", "MID"),
                course(DayName::Wednesday, "12:00 PM", "01:00 PM", "NOON"),
            ],
        );
        let grid = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        let times: Vec<String> = grid.rows.iter().map(|r| r.time.to_string()).collect();
        assert_eq!(times, ["09:00 AM", "10:30 AM", "12:00 PM"]);

        match grid.cell(0, 0).unwrap() {
            Cell::Anchor { course, row_span, .. } => {
                assert_eq!(course.title, "LONG");
                assert_eq!(*row_span, 2);
            }
            other => panic!("expected anchor, got {other:?}"),
        }
        assert_eq!(grid.cell(1, 0), Some(&Cell::Merged));
        assert_eq!(grid.cell(2, 0), Some(&Cell::Empty));
        assert!(grid.hazards.is_empty());
    }

    #[test]
    fn end_only_boundary_collapses_to_one_row() {
        let s = schedule(
            &[DayName::Monday],
            vec![course(DayName::Monday, "09:00 AM", "10:30 AM", "ART APPRECIATION")],
        );
        let grid = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(grid.rows.len(), 1);
        assert!(matches!(
            grid.cell(0, 0),
            Some(Cell::Anchor { row_span: 1, .. })
        ));
    }

    #[test]
    fn start_and_end_policy_keeps_true_duration() {
        let s = schedule(
            &[DayName::Monday, DayName::Tuesday],
            vec![
                course(DayName::Monday, "09:00 AM", "12:00 PM", "A"),
                course(DayName::Tuesday, "09:00 AM", "10:30 AM", "B"),
            ],
        );
        let compat = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(compat.rows.len(), 1);

        let full = build(&s, sunday_night(), BoundaryPolicy::StartAndEnd);
        let times: Vec<String> = full.rows.iter().map(|r| r.time.to_string()).collect();
        assert_eq!(times, ["09:00 AM", "10:30 AM", "12:00 PM"]);
        assert!(matches!(full.cell(0, 0), Some(Cell::Anchor { row_span: 2, .. })));
        assert!(matches!(full.cell(0, 1), Some(Cell::Anchor { row_span: 1, .. })));
        assert_eq!(full.cell(1, 0), Some(&Cell::Merged));
        assert_eq!(full.cell(1, 1), Some(&Cell::Empty));
        assert_eq!(full.cell(2, 0), Some(&Cell::Empty));
    }

    #[test]
    fn earliest_time_is_a_row_even_if_only_an_end() {
        let s = schedule(
            &[DayName::Monday],
            vec![
                // 11:00 AM is only ever an end time.
                course(DayName::Monday, "09:00 AM", "10:00 AM", "LATER"),
                course(DayName::Monday, "10:00 AM", "11:00 AM", "NEXT"),
            ],
        );
        let rows = boundaries(&s, BoundaryPolicy::StartTimes);
        assert_eq!(rows, vec![t("09:00 AM"), t("10:00 AM")]);

        let inverted = schedule(
            &[DayName::Monday],
            vec![course(DayName::Monday, "09:00 AM", "07:00 AM", "BACKWARDS")],
        );
        let rows = boundaries(&inverted, BoundaryPolicy::StartTimes);
        assert_eq!(rows, vec![t("07:00 AM"), t("09:00 AM")]);
        let grid = build(&inverted, sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(grid.cell(0, 0), Some(&Cell::Empty));
        assert!(matches!(grid.cell(1, 0), Some(Cell::Anchor { row_span: 1, .. })));
    }

    #[test]
    fn duplicate_start_keeps_first_in_source_order() {
        let s = schedule(
            &[DayName::Friday],
            vec![
                course(DayName::Friday, "01:30 PM", "03:00 PM", "FIRST"),
                course(DayName::Friday, "01:30 PM", "03:00 PM", "SECOND"),
            ],
        );
        let grid = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        let titles: Vec<&str> = grid.anchors().map(|(_, _, c, _)| c.title.as_str()).collect();
        assert_eq!(titles, ["FIRST"]);
        assert_eq!(grid.hazards.len(), 1);
        assert!(matches!(&grid.hazards[0], DataHazard::DuplicateStart { title, .. } if title == "SECOND"));
    }

    #[test]
    fn course_inside_another_is_shadowed() {
        let s = schedule(
            &[DayName::Monday],
            vec![
                course(DayName::Monday, "09:00 AM", "12:00 PM", "OUTER"),
                course(DayName::Monday, "10:30 AM", "11:00 AM", "INNER"),
                course(DayName::Monday, "12:00 PM", "01:00 PM", "AFTER"),
            ],
        );
        let grid = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(grid.cell(1, 0), Some(&Cell::Merged));
        assert!(matches!(grid.cell(2, 0), Some(Cell::Anchor { course, .. }) if course.title == "AFTER"));
        assert_eq!(grid.hazards.len(), 1);
        assert_eq!(grid.hazards[0].title(), "INNER");
        assert_eq!(hazards(&s, BoundaryPolicy::StartTimes), grid.hazards);
    }

    #[test]
    fn courses_on_unlisted_days_are_ignored() {
        let s = schedule(
            &[DayName::Monday],
            vec![course(DayName::Saturday, "10:00 AM", "01:00 PM", "CWTS 1")],
        );
        let grid = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(grid.anchors().count(), 0);
        assert!(grid.hazards.is_empty());
    }

    #[test]
    fn columns_follow_schedule_day_order() {
        let days = [DayName::Saturday, DayName::Monday];
        let grid = build(&schedule(&days, vec![]), sunday_night(), BoundaryPolicy::StartTimes);
        let order: Vec<DayName> = grid.columns.iter().map(|c| c.day).collect();
        assert_eq!(order, days);
    }

    #[test]
    fn highlights_current_row_in_todays_column() {
        let s = schedule(
            &[DayName::Monday, DayName::Tuesday],
            vec![
                course(DayName::Monday, "09:00 AM", "10:30 AM", "A"),
                course(DayName::Monday, "10:30 AM", "12:00 PM", "B"),
                course(DayName::Tuesday, "10:30 AM", "12:00 PM", "C"),
            ],
        );
        let now = Now::new(DayName::Monday, t("11:15 AM"));
        let grid = build(&s, now, BoundaryPolicy::StartTimes);

        assert!(grid.columns[0].is_today);
        assert!(!grid.columns[1].is_today);
        assert!(!grid.rows[0].is_current);
        assert!(grid.rows[1].is_current);
        assert!(matches!(grid.cell(1, 0), Some(Cell::Anchor { highlighted: true, .. })));
        assert!(matches!(grid.cell(1, 1), Some(Cell::Anchor { highlighted: false, .. })));
        assert!(matches!(grid.cell(0, 0), Some(Cell::Anchor { highlighted: false, .. })));
    }

    #[test]
    fn last_row_runs_to_end_of_day() {
        let times = [t("09:00 AM"), t("01:00 PM")];
        assert_eq!(current_row(&times, t("11:59 PM")), Some(1));
        assert_eq!(current_row(&times, t("08:59 AM")), None);
        assert_eq!(current_row(&times, t("09:00 AM")), Some(0));
    }

    #[test]
    fn single_monday_course_end_to_end() {
        let s = schedule(
            &WEEKDAYS,
            vec![course(DayName::Monday, "09:00 AM", "10:30 AM", "ART APPRECIATION")],
        );
        let grid = build(&s, sunday_night(), BoundaryPolicy::StartTimes);
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].time, t("09:00 AM"));
        match grid.cell(0, 0).unwrap() {
            Cell::Anchor { course, row_span, .. } => {
                assert_eq!(course.title, "ART APPRECIATION");
                assert_eq!(course.room, "Room X");
                assert_eq!(*row_span, 1);
            }
            other => panic!("expected anchor, got {other:?}"),
        }
        assert!(grid.rows[0].cells[1..].iter().all(|c| *c == Cell::Empty));
    }

    /// Walks every column and checks anchors and merged cells tile it with
    /// no overlap and no orphan merged cell.
    fn assert_tiles(grid: &Grid, label: &str) {
        assert!(!grid.rows.is_empty());
        for col in 0..grid.columns.len() {
            let mut row = 0;
            while row < grid.rows.len() {
                match grid.cell(row, col).unwrap() {
                    Cell::Anchor { row_span, .. } => {
                        assert!(*row_span >= 1);
                        assert!(row + row_span <= grid.rows.len(), "span overflows in {label}");
                        for below in row + 1..row + row_span {
                            assert_eq!(grid.cell(below, col), Some(&Cell::Merged), "{label}");
                        }
                        row += row_span;
                    }
                    Cell::Empty => row += 1,
                    Cell::Merged => panic!("orphan merged cell at {row},{col} in {label}"),
                }
            }
        }
    }

    #[test]
    fn no_overlapping_cells_in_builtin_fixtures() {
        let store = ScheduleStore::builtin().unwrap();
        for policy in [BoundaryPolicy::StartTimes, BoundaryPolicy::StartAndEnd] {
            for s in store.list() {
                assert_tiles(&build(s, sunday_night(), policy), &s.id);
            }
        }
    }

    #[rstest]
    #[case(BoundaryPolicy::StartTimes)]
    #[case(BoundaryPolicy::StartAndEnd)]
    fn no_overlapping_cells_in_irregular_schedule(#[case] policy: BoundaryPolicy) {
        use DayName::*;
        let s = schedule(
            &[Monday, Tuesday],
            vec![
                course(Monday, "09:00 AM", "11:00 AM", "A"),
                course(Monday, "10:00 AM", "12:00 PM", "B"),
                course(Monday, "11:30 AM", "01:00 PM", "C"),
                course(Monday, "08:00 AM", "08:30 AM", "D"),
                course(Tuesday, "10:00 AM", "01:00 PM", "E"),
            ],
        );
        let grid = build(&s, Now::new(Monday, t("10:15 AM")), policy);
        assert_tiles(&grid, &format!("{policy:?}"));

        // Every course is either placed once or reported as dropped.
        let placed = grid.anchors().count();
        assert_eq!(placed + grid.hazards.len(), s.courses.len());
        let anchored: Vec<&str> = grid.anchors().map(|(_, _, c, _)| c.title.as_str()).collect();
        assert!(anchored.contains(&"A") && anchored.contains(&"D") && anchored.contains(&"E"));
    }

    #[test]
    fn builtin_duplicates_are_reported() {
        let store = ScheduleStore::builtin().unwrap();
        let s = store.find_by_id("ioa-bsa-1-1stsem-year-1").unwrap();
        let found = hazards(s, BoundaryPolicy::StartTimes);
        let titles: Vec<&str> = found.iter().map(|h| h.title()).collect();
        assert_eq!(titles, ["ECONOMIC DEVELOPMENT", "OPERATION MANAGEMENT AND TQM"]);
    }
}
