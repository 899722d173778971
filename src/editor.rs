//! The single commit path for schedule mutations.
//!
//! Every edit works on a copy of the affected shift list, re-chains times
//! where the edit touched them, and only then swaps the copy into the week.

use crate::recalc::{
    append_slot, recalculate, recalculate_from, BreakPolicy, DEFAULT_LESSON_MINUTES,
};
use crate::schedule::{DayId, Lesson, ShiftId, WeeklySchedule};
use crate::time_of_day::{TimeOfDay, TimeParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Rename { shift: ShiftId, id: String, name: String },
    /// Re-anchors the lesson at `time` with the default duration and
    /// re-chains everything after it.
    SetStart { shift: ShiftId, id: String, time: String },
    SetEnd { shift: ShiftId, id: String, time: String },
    AddLesson { shift: ShiftId },
    DeleteLesson { shift: ShiftId, id: String },
    ToggleLesson { shift: ShiftId, id: String },
    ToggleDay,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no lesson {id:?} in {shift} on {day}")]
    UnknownLesson {
        day: DayId,
        shift: ShiftId,
        id: String,
    },

    #[error(transparent)]
    MalformedTime(#[from] TimeParseError),
}

impl WeeklySchedule {
    /// Applies one edit to `day`. On error the schedule is left unchanged.
    pub fn apply(
        &mut self,
        day: DayId,
        edit: Edit,
        policy: &dyn BreakPolicy,
    ) -> Result<(), EditError> {
        let Some(shift) = edit.shift() else {
            let schedule = self.day_mut(day);
            schedule.is_active = !schedule.is_active;
            return Ok(());
        };

        let current = self.lessons(day, shift);
        let updated = edited(current, day, edit, policy)?;
        *self.day_mut(day).lessons_mut(shift) = updated;
        Ok(())
    }
}

impl Edit {
    pub fn shift(&self) -> Option<ShiftId> {
        match self {
            Edit::Rename { shift, .. }
            | Edit::SetStart { shift, .. }
            | Edit::SetEnd { shift, .. }
            | Edit::AddLesson { shift }
            | Edit::DeleteLesson { shift, .. }
            | Edit::ToggleLesson { shift, .. } => Some(*shift),
            Edit::ToggleDay => None,
        }
    }
}

fn position(
    lessons: &[Lesson],
    day: DayId,
    shift: ShiftId,
    id: &str,
) -> Result<usize, EditError> {
    lessons
        .iter()
        .position(|l| l.id == id)
        .ok_or_else(|| EditError::UnknownLesson {
            day,
            shift,
            id: id.to_string(),
        })
}

fn edited(
    current: &[Lesson],
    day: DayId,
    edit: Edit,
    policy: &dyn BreakPolicy,
) -> Result<Vec<Lesson>, EditError> {
    let mut lessons = current.to_vec();

    match edit {
        Edit::Rename { shift, id, name } => {
            let idx = position(&lessons, day, shift, &id)?;
            lessons[idx].name = name;
            Ok(lessons)
        }
        Edit::SetStart { shift, id, time } => {
            let start = TimeOfDay::parse(&time)?;
            let idx = position(&lessons, day, shift, &id)?;
            lessons[idx].start_time = start.to_string();
            lessons[idx].end_time = start.add_minutes(DEFAULT_LESSON_MINUTES).to_string();
            Ok(recalculate_from(&lessons, idx, policy))
        }
        Edit::SetEnd { shift, id, time } => {
            let end = TimeOfDay::parse(&time)?;
            let idx = position(&lessons, day, shift, &id)?;
            lessons[idx].end_time = end.to_string();
            Ok(recalculate(&lessons, policy))
        }
        Edit::AddLesson { shift } => {
            let (start, end) = append_slot(&lessons, shift.default_anchor(), policy);
            lessons.push(Lesson::new(
                uuid::Uuid::new_v4().to_string(),
                format!("{}-lesson", lessons.len() + 1),
                start.to_string(),
                end.to_string(),
            ));
            Ok(lessons)
        }
        Edit::DeleteLesson { shift, id } => {
            let idx = position(&lessons, day, shift, &id)?;
            lessons.remove(idx);
            Ok(recalculate(&lessons, policy))
        }
        Edit::ToggleLesson { shift, id } => {
            let idx = position(&lessons, day, shift, &id)?;
            lessons[idx].is_active = !lessons[idx].is_active;
            Ok(lessons)
        }
        Edit::ToggleDay => Ok(lessons),
    }
}
