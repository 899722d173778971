use chrono::{NaiveDate, NaiveDateTime};

use crate::config::{Config, SavedState, StateStore};
use crate::device::BellConfig;
use crate::editor::{Edit, EditError};
use crate::schedule::{DayId, Lesson, ShiftId, WeeklySchedule};
use crate::status::{evaluate, Status};

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("fix invalid lesson times before saving")]
    InvalidTimes,

    #[error("could not write state: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the dashboard shows and edits, plus which day and shift are in
/// view.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub config: Config,
    pub schedule: WeeklySchedule,
    pub selected_day: DayId,
    pub selected_shift: ShiftId,
    /// When set, `tick` moves `selected_day` along with the calendar.
    pub follow_clock: bool,
}

impl Board {
    /// Opens on today's weekday. Stored times are shown as saved.
    pub fn from_saved(saved: SavedState, today: NaiveDate) -> Self {
        Self {
            config: saved.config,
            schedule: saved.schedule,
            selected_day: DayId::of(today),
            selected_shift: saved.selected_shift,
            follow_clock: true,
        }
    }

    pub fn to_saved(&self) -> SavedState {
        SavedState {
            config: self.config.clone(),
            schedule: self.schedule.clone(),
            selected_shift: self.selected_shift,
        }
    }

    pub fn tick(&mut self, now: NaiveDateTime) {
        if self.follow_clock {
            self.selected_day = DayId::of(now.date());
        }
    }

    /// Shows `day` until [`Board::follow_today`] is called.
    pub fn select_day(&mut self, day: DayId) {
        self.selected_day = day;
        self.follow_clock = false;
    }

    pub fn follow_today(&mut self, today: NaiveDate) {
        self.follow_clock = true;
        self.selected_day = DayId::of(today);
    }

    pub fn select_shift(&mut self, shift: ShiftId) {
        self.selected_shift = shift;
    }

    pub fn toggle_shift(&mut self) {
        self.selected_shift = self.selected_shift.toggle();
    }

    pub fn lessons(&self) -> &[Lesson] {
        self.schedule.lessons(self.selected_day, self.selected_shift)
    }

    /// Status of the selected day and shift at `now`. A holiday today only
    /// turns today's weekday into a day off.
    pub fn status(&self, now: NaiveDateTime) -> Status {
        let today = now.date();
        let holiday = self.selected_day == DayId::of(today) && self.config.is_holiday(today);
        let day_is_active = self.schedule.is_active(self.selected_day) && !holiday;
        evaluate(self.lessons(), day_is_active, now, today)
    }

    pub fn commit(&mut self, day: DayId, edit: Edit) -> Result<(), EditError> {
        tracing::debug!(?day, ?edit, "applying edit");
        let result = self.schedule.apply(day, edit, &self.config.breaks);
        if let Err(err) = &result {
            tracing::info!(?day, %err, "edit rejected");
        }
        result
    }

    pub fn can_save(&self) -> bool {
        !self.schedule.has_invalid_times()
    }

    pub fn save(&self, store: &dyn StateStore) -> Result<(), SaveError> {
        if !self.can_save() {
            tracing::info!("save refused: invalid lesson times");
            return Err(SaveError::InvalidTimes);
        }
        store.save(&self.to_saved())?;
        tracing::info!("schedule saved");
        Ok(())
    }

    pub fn bell_config(&self, day: DayId) -> BellConfig {
        BellConfig::from_schedule(&self.schedule, day, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveTime;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<Option<SavedState>>,
    }

    impl StateStore for MemoryStore {
        fn load(&self) -> SavedState {
            self.saved.borrow().clone().unwrap_or_default()
        }

        fn save(&self, state: &SavedState) -> std::io::Result<()> {
            *self.saved.borrow_mut() = Some(state.clone());
            Ok(())
        }
    }

    // 2024-09-05 is a Thursday
    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()
    }

    fn at(date: NaiveDate, hm: &str) -> NaiveDateTime {
        date.and_time(NaiveTime::parse_from_str(hm, "%H:%M").unwrap())
    }

    fn board() -> Board {
        Board::from_saved(SavedState::default(), thursday())
    }

    #[test]
    fn opens_on_todays_weekday() {
        let b = board();
        assert_eq!(b.selected_day, DayId::Thursday);
        assert_eq!(b.selected_shift, ShiftId::First);
        assert!(b.follow_clock);
    }

    #[test]
    fn tick_follows_midnight_until_pinned() {
        let mut b = board();
        let friday = thursday().succ_opt().unwrap();
        b.tick(at(friday, "00:00"));
        assert_eq!(b.selected_day, DayId::Friday);

        b.select_day(DayId::Monday);
        b.tick(at(friday, "08:00"));
        assert_eq!(b.selected_day, DayId::Monday);

        b.follow_today(friday);
        assert_eq!(b.selected_day, DayId::Friday);
    }

    #[test]
    fn status_uses_selected_shift() {
        let mut b = board();
        let status = b.status(at(thursday(), "08:20"));
        assert_eq!(status.active_lesson_id.as_deref(), Some("thu-1-1"));

        b.toggle_shift();
        let status = b.status(at(thursday(), "13:40"));
        assert_eq!(status.active_lesson_id.as_deref(), Some("thu-2-1"));
    }

    #[test]
    fn holidays_are_days_off() {
        let mut b = board();
        b.config.holidays.push(thursday());
        let status = b.status(at(thursday(), "08:20"));
        assert_eq!(status.kind, crate::status::StatusKind::DayOff);

        b.select_day(DayId::Monday);
        let status = b.status(at(thursday(), "08:20"));
        assert_eq!(status.kind, crate::status::StatusKind::InLesson);
        assert_eq!(status.active_lesson_id.as_deref(), Some("mon-1-1"));
    }

    #[test]
    fn save_is_gated_on_valid_times() {
        let mut b = board();
        let store = MemoryStore::default();
        let first = b.lessons()[0].id.clone();
        b.commit(
            DayId::Thursday,
            Edit::SetEnd {
                shift: ShiftId::First,
                id: first.clone(),
                time: "07:00".into(),
            },
        )
        .unwrap();
        assert!(!b.can_save());
        assert_matches!(b.save(&store), Err(SaveError::InvalidTimes));
        assert!(store.saved.borrow().is_none());

        b.commit(
            DayId::Thursday,
            Edit::SetEnd {
                shift: ShiftId::First,
                id: first,
                time: "08:45".into(),
            },
        )
        .unwrap();
        b.save(&store).unwrap();
        assert_eq!(store.load(), b.to_saved());
    }

    #[test]
    fn inactive_day_does_not_block_save() {
        let mut b = board();
        let first = b.lessons()[0].id.clone();
        b.commit(
            DayId::Thursday,
            Edit::SetEnd {
                shift: ShiftId::First,
                id: first,
                time: "07:00".into(),
            },
        )
        .unwrap();
        b.commit(DayId::Thursday, Edit::ToggleDay).unwrap();
        assert!(b.can_save());
    }

    #[test]
    fn commit_uses_configured_breaks() {
        let mut b = board();
        b.config.breaks = crate::recalc::BreakTable::fixed(10);
        let last = b.lessons()[4].id.clone();
        b.commit(
            DayId::Thursday,
            Edit::DeleteLesson {
                shift: ShiftId::First,
                id: last,
            },
        )
        .unwrap();
        assert_eq!(b.lessons()[1].start_time, "08:55");
    }

    #[test]
    fn bell_config_reflects_config() {
        let mut b = board();
        b.config.bell_duration_sec = 9;
        let bell = b.bell_config(DayId::Thursday);
        assert_eq!(bell.bell_duration_sec, 9);
        assert_eq!(bell.shift1.start, "08:00");
    }
}
