//! Deterministic re-chaining of lesson times within one shift.
//!
//! The first lesson is the anchor. Every later lesson starts at the previous
//! lesson's end plus the break for that position and keeps its own duration.

use serde::{Deserialize, Serialize};

use crate::schedule::Lesson;
use crate::time_of_day::TimeOfDay;

pub const DEFAULT_LESSON_MINUTES: i32 = 45;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Minutes of break after the lesson at `index` (0-based position in the shift).
pub trait BreakPolicy {
    fn gap_after(&self, index: usize) -> u32;
}

impl<F> BreakPolicy for F
where
    F: Fn(usize) -> u32,
{
    fn gap_after(&self, index: usize) -> u32 {
        self(index)
    }
}

/// Position-indexed break table with a fallback for positions past its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTable {
    #[serde(default)]
    pub gaps: Vec<u32>,
    #[serde(default = "default_gap")]
    pub default_gap: u32,
}

fn default_gap() -> u32 {
    DEFAULT_BREAK_MINUTES
}

impl BreakTable {
    pub fn new(gaps: Vec<u32>, default_gap: u32) -> Self {
        Self { gaps, default_gap }
    }

    /// Same break after every lesson.
    pub fn fixed(minutes: u32) -> Self {
        Self::new(Vec::new(), minutes)
    }
}

impl Default for BreakTable {
    /// Short breaks, with a long one after the third lesson.
    fn default() -> Self {
        Self::new(vec![5, 5, 15], DEFAULT_BREAK_MINUTES)
    }
}

impl BreakPolicy for BreakTable {
    fn gap_after(&self, index: usize) -> u32 {
        self.gaps.get(index).copied().unwrap_or(self.default_gap)
    }
}

/// Recalculates every lesson after the first. See [`recalculate_from`].
pub fn recalculate(lessons: &[Lesson], policy: &dyn BreakPolicy) -> Vec<Lesson> {
    recalculate_from(lessons, 0, policy)
}

/// Returns a fresh list where lessons up to and including `anchor` are copied
/// unchanged and each later lesson `i` starts at `end(i-1) + gap_after(i-1)`.
///
/// The duration of lesson `i` is taken from the input list; a non-positive or
/// unparseable duration becomes [`DEFAULT_LESSON_MINUTES`]. When the previous
/// end does not parse, lesson `i` is left as it was. Times saturate at 23:59.
pub fn recalculate_from(
    lessons: &[Lesson],
    anchor: usize,
    policy: &dyn BreakPolicy,
) -> Vec<Lesson> {
    let mut result = lessons.to_vec();

    for i in (anchor + 1)..result.len() {
        let Some(prev_end) = result[i - 1].end() else {
            continue;
        };
        let start = prev_end.add_minutes(gap_minutes(policy, i - 1));
        let end = start.add_minutes(intended_duration(&lessons[i]));

        result[i].start_time = start.to_string();
        result[i].end_time = end.to_string();
    }

    result
}

fn gap_minutes(policy: &dyn BreakPolicy, index: usize) -> i32 {
    i32::try_from(policy.gap_after(index)).unwrap_or(i32::MAX)
}

fn intended_duration(lesson: &Lesson) -> i32 {
    lesson
        .duration()
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_LESSON_MINUTES)
}

/// Start and end for a lesson appended to `lessons`: the configured break
/// after the current last lesson, or `empty_anchor` when there is nothing to
/// chain from.
pub fn append_slot(
    lessons: &[Lesson],
    empty_anchor: TimeOfDay,
    policy: &dyn BreakPolicy,
) -> (TimeOfDay, TimeOfDay) {
    let start = lessons
        .last()
        .and_then(|last| last.end())
        .map(|end| end.add_minutes(gap_minutes(policy, lessons.len() - 1)))
        .unwrap_or(empty_anchor);
    (start, start.add_minutes(DEFAULT_LESSON_MINUTES))
}
