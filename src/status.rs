//! Live status of the selected day and shift.
//!
//! Lessons are half-open intervals `[start, end)`: at the exact minute one
//! lesson ends and the next begins, the later lesson is the active one, and the
//! end of the last lesson already counts as after hours.

use chrono::{NaiveDate, NaiveDateTime};

use crate::schedule::Lesson;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum StatusKind {
    #[strum(to_string = "Day off")]
    DayOff,
    #[strum(to_string = "No lessons")]
    NoLessons,
    #[strum(to_string = "Not started")]
    BeforeHours,
    #[strum(to_string = "Lesson")]
    InLesson,
    #[strum(to_string = "Break")]
    InBreak,
    #[strum(to_string = "Finished")]
    AfterHours,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
    pub active_lesson_id: Option<String>,
}

impl Status {
    fn of(kind: StatusKind) -> Self {
        Self {
            kind,
            text: kind.to_string(),
            active_lesson_id: None,
        }
    }

    fn in_lesson(lesson: &Lesson) -> Self {
        Self {
            kind: StatusKind::InLesson,
            text: lesson.name.clone(),
            active_lesson_id: Some(lesson.id.clone()),
        }
    }
}

struct Interval<'a> {
    start: NaiveDateTime,
    end: NaiveDateTime,
    lesson: &'a Lesson,
}

/// Classifies `now` against the lessons of one shift on `today`.
///
/// Disabled lessons and lessons whose times do not parse or do not end after
/// they start take no part in the evaluation. When nothing usable remains the result is
/// [`StatusKind::NoLessons`]. Input order does not matter; ties on start time
/// keep list order.
pub fn evaluate(
    lessons: &[Lesson],
    day_is_active: bool,
    now: NaiveDateTime,
    today: NaiveDate,
) -> Status {
    if !day_is_active {
        return Status::of(StatusKind::DayOff);
    }

    let mut intervals: Vec<Interval> = lessons
        .iter()
        .filter(|l| l.is_active && l.is_valid())
        .filter_map(|lesson| {
            Some(Interval {
                start: lesson.start()?.on(today),
                end: lesson.end()?.on(today),
                lesson,
            })
        })
        .collect();

    if intervals.is_empty() {
        return Status::of(StatusKind::NoLessons);
    }

    intervals.sort_by_key(|iv| iv.start);

    let first_start = intervals[0].start;
    let last_end = intervals.iter().map(|iv| iv.end).max().unwrap_or(first_start);

    if now >= last_end {
        return Status::of(StatusKind::AfterHours);
    }
    if now < first_start {
        return Status::of(StatusKind::BeforeHours);
    }

    intervals
        .iter()
        .find(|iv| iv.start <= now && now < iv.end)
        .map(|iv| Status::in_lesson(iv.lesson))
        .unwrap_or_else(|| Status::of(StatusKind::InBreak))
}
