use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::recalc::{recalculate, BreakPolicy, BreakTable, DEFAULT_LESSON_MINUTES};
use crate::time_of_day::{minutes_between, TimeOfDay};

pub const LESSONS_PER_SEEDED_SHIFT: usize = 5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DayId {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayId {
    pub const ALL: [DayId; 7] = [
        DayId::Monday,
        DayId::Tuesday,
        DayId::Wednesday,
        DayId::Thursday,
        DayId::Friday,
        DayId::Saturday,
        DayId::Sunday,
    ];

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_monday() as usize]
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }

    /// Position in the device's `activeDays` array (Monday = 0).
    pub fn device_index(self) -> usize {
        self as usize
    }

    pub fn short(self) -> &'static str {
        match self {
            DayId::Monday => "mon",
            DayId::Tuesday => "tue",
            DayId::Wednesday => "wed",
            DayId::Thursday => "thu",
            DayId::Friday => "fri",
            DayId::Saturday => "sat",
            DayId::Sunday => "sun",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.device_index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.device_index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Sunday is the rest day in the seeded schedule.
    pub fn is_rest_day(self) -> bool {
        self == DayId::Sunday
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weekday {0:?}")]
pub struct ParseDayError(pub String);

impl FromStr for DayId {
    type Err = ParseDayError;

    /// Full English names or three-letter forms, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.short() == wanted || d.to_string().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ParseDayError(s.to_string()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    strum_macros::Display,
)]
pub enum ShiftId {
    #[default]
    #[strum(to_string = "Shift 1")]
    First,
    #[strum(to_string = "Shift 2")]
    Second,
}

impl ShiftId {
    /// Start time for a lesson appended to an empty shift.
    pub fn default_anchor(self) -> TimeOfDay {
        match self {
            ShiftId::First => TimeOfDay::from_hm(8, 0),
            ShiftId::Second => TimeOfDay::from_hm(13, 0),
        }
        .unwrap_or(TimeOfDay::MIDNIGHT)
    }

    /// Shift window reported to the bell device when the shift has no lessons.
    pub fn fallback_window(self) -> (&'static str, &'static str) {
        match self {
            ShiftId::First => ("08:00", "12:00"),
            ShiftId::Second => ("13:00", "17:00"),
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ShiftId::First => ShiftId::Second,
            ShiftId::Second => ShiftId::First,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One lesson slot. Times are kept as entered so malformed values survive a
/// load and can be flagged instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Lesson {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            is_active: true,
        }
    }

    pub fn start(&self) -> Option<TimeOfDay> {
        TimeOfDay::parse(&self.start_time).ok()
    }

    pub fn end(&self) -> Option<TimeOfDay> {
        TimeOfDay::parse(&self.end_time).ok()
    }

    /// Length in minutes when both times parse.
    pub fn duration(&self) -> Option<i32> {
        Some(minutes_between(self.start()?, self.end()?))
    }

    /// Both times parse and the lesson starts before it ends.
    pub fn is_valid(&self) -> bool {
        matches!((self.start(), self.end()), (Some(s), Some(e)) if s < e)
    }
}

/// Break minutes between each pair of consecutive lessons, in list order.
/// `None` where either boundary fails to parse.
pub fn gaps(lessons: &[Lesson]) -> Vec<Option<i32>> {
    lessons
        .windows(2)
        .map(|pair| Some(minutes_between(pair[0].end()?, pair[1].start()?)))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shifts {
    #[serde(default)]
    pub shift1: Vec<Lesson>,
    #[serde(default)]
    pub shift2: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day_id: DayId,
    pub is_active: bool,
    #[serde(default)]
    pub shifts: Shifts,
}

impl DaySchedule {
    pub fn empty(day_id: DayId) -> Self {
        Self {
            day_id,
            is_active: !day_id.is_rest_day(),
            shifts: Shifts::default(),
        }
    }

    pub fn lessons(&self, shift: ShiftId) -> &[Lesson] {
        match shift {
            ShiftId::First => &self.shifts.shift1,
            ShiftId::Second => &self.shifts.shift2,
        }
    }

    pub fn lessons_mut(&mut self, shift: ShiftId) -> &mut Vec<Lesson> {
        match shift {
            ShiftId::First => &mut self.shifts.shift1,
            ShiftId::Second => &mut self.shifts.shift2,
        }
    }

    /// Lessons across both shifts that fail [`Lesson::is_valid`].
    pub fn invalid_lessons(&self) -> impl Iterator<Item = (ShiftId, &Lesson)> {
        [ShiftId::First, ShiftId::Second]
            .into_iter()
            .flat_map(move |shift| self.lessons(shift).iter().map(move |l| (shift, l)))
            .filter(|(_, l)| !l.is_valid())
    }
}

/// The whole week, keyed by weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    days: BTreeMap<DayId, DaySchedule>,
}

impl WeeklySchedule {
    /// Every weekday present with no lessons; Sunday inactive.
    pub fn empty() -> Self {
        Self {
            days: DayId::ALL
                .into_iter()
                .map(|d| (d, DaySchedule::empty(d)))
                .collect(),
        }
    }

    /// Five 45-minute lessons per shift on every active day, chained with
    /// `policy`. Shift 1 starts at 08:00 and shift 2 at 13:30.
    pub fn seeded(policy: &dyn BreakPolicy) -> Self {
        let mut week = Self::empty();
        for day in week.days.values_mut().filter(|d| d.is_active) {
            for (shift, anchor) in [
                (ShiftId::First, TimeOfDay::from_hm(8, 0)),
                (ShiftId::Second, TimeOfDay::from_hm(13, 30)),
            ] {
                let anchor = anchor.unwrap_or(TimeOfDay::MIDNIGHT);
                let draft = seed_shift(day.day_id, shift, anchor);
                *day.lessons_mut(shift) = recalculate(&draft, policy);
            }
        }
        week
    }

    pub fn day(&self, day: DayId) -> Option<&DaySchedule> {
        self.days.get(&day)
    }

    /// Mutable access, inserting an empty day when a loaded document lacks it.
    pub fn day_mut(&mut self, day: DayId) -> &mut DaySchedule {
        self.days
            .entry(day)
            .or_insert_with(|| DaySchedule::empty(day))
    }

    pub fn days(&self) -> impl Iterator<Item = &DaySchedule> {
        self.days.values()
    }

    pub fn lessons(&self, day: DayId, shift: ShiftId) -> &[Lesson] {
        self.day(day).map(|d| d.lessons(shift)).unwrap_or(&[])
    }

    pub fn is_active(&self, day: DayId) -> bool {
        self.day(day).is_some_and(|d| d.is_active)
    }

    pub fn active_days(&self) -> Vec<DayId> {
        self.days().filter(|d| d.is_active).map(|d| d.day_id).collect()
    }

    /// Any lesson on an active day with an invalid time range. Blocks saving.
    pub fn has_invalid_times(&self) -> bool {
        self.days()
            .filter(|d| d.is_active)
            .any(|d| d.invalid_lessons().next().is_some())
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self::seeded(&BreakTable::default())
    }
}

fn seed_shift(day: DayId, shift: ShiftId, anchor: TimeOfDay) -> Vec<Lesson> {
    let shift_no = match shift {
        ShiftId::First => 1,
        ShiftId::Second => 2,
    };
    let end = anchor.add_minutes(DEFAULT_LESSON_MINUTES);
    (1..=LESSONS_PER_SEEDED_SHIFT)
        .map(|n| {
            Lesson::new(
                format!("{}-{}-{}", day.short(), shift_no, n),
                format!("{n}-lesson"),
                anchor.to_string(),
                end.to_string(),
            )
        })
        .collect()
}
