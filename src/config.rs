use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::device::DEFAULT_DEVICE_URL;
use crate::recalc::BreakTable;
use crate::schedule::{ShiftId, WeeklySchedule};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub school_name: String,
    pub subtitle: String,
    pub device_url: String,
    pub bell_duration_sec: u32,
    pub breaks: BreakTable,
    pub custom_times: Vec<String>,
    pub holidays: Vec<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            school_name: "School No. 4".to_string(),
            subtitle: "School bell".to_string(),
            device_url: DEFAULT_DEVICE_URL.to_string(),
            bell_duration_sec: 5,
            breaks: BreakTable::default(),
            custom_times: Vec::new(),
            holidays: Vec::new(),
        }
    }
}

impl Config {
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

/// Everything written to disk on save, as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedState {
    #[serde(default)]
    pub config: Config,
    pub schedule: WeeklySchedule,
    #[serde(default)]
    pub selected_shift: ShiftId,
}

impl Default for SavedState {
    fn default() -> Self {
        let config = Config::default();
        let schedule = WeeklySchedule::seeded(&config.breaks);
        Self {
            config,
            schedule,
            selected_shift: ShiftId::First,
        }
    }
}

pub trait StateStore {
    fn load(&self) -> SavedState;
    fn save(&self, state: &SavedState) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new() -> Self {
        let path = AppDirs::state_path().unwrap_or_else(|| PathBuf::from("bellboard_state.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> SavedState {
        let Ok(bytes) = fs::read(&self.path) else {
            return SavedState::default();
        };
        match serde_json::from_slice::<SavedState>(&bytes) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable state file");
                SavedState::default()
            }
        }
    }

    fn save(&self, state: &SavedState) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(state)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{DayId, Lesson};
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStateStore::with_path(&path);
        let state = SavedState::default();
        store.save(&state).unwrap();
        let loaded = store.load();
        assert_eq!(state, loaded);
    }

    #[test]
    fn save_and_load_custom_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = FileStateStore::with_path(&path);
        let mut state = SavedState {
            config: Config {
                school_name: "Lyceum".into(),
                subtitle: "Bells".into(),
                device_url: "http://10.0.0.7".into(),
                bell_duration_sec: 3,
                breaks: BreakTable::new(vec![10, 10, 30], 10),
                custom_times: vec!["12:30".into()],
                holidays: vec![NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()],
            },
            schedule: WeeklySchedule::empty(),
            selected_shift: ShiftId::Second,
        };
        state
            .schedule
            .day_mut(DayId::Monday)
            .lessons_mut(ShiftId::Second)
            .push(Lesson::new("x", "1-lesson", "13:00", "bad"));
        store.save(&state).unwrap();
        let loaded = store.load();
        assert_eq!(state, loaded);
        assert!(loaded.config.is_holiday(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
    }

    #[test]
    fn missing_file_loads_seeded_default() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), SavedState::default());
    }

    #[test]
    fn corrupt_file_loads_seeded_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();
        let store = FileStateStore::with_path(&path);
        assert_eq!(store.load(), SavedState::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let json = r#"{"config":{"school_name":"Gymnasium"},"schedule":{"days":{}}}"#;
        let state: SavedState = serde_json::from_str(json).unwrap();
        assert_eq!(state.config.school_name, "Gymnasium");
        assert_eq!(state.config.bell_duration_sec, 5);
        assert_eq!(state.config.breaks, BreakTable::default());
        assert_eq!(state.selected_shift, ShiftId::First);
    }

    #[test]
    fn holidays_serialize_as_dates() {
        let config = Config {
            holidays: vec![NaiveDate::from_ymd_opt(2025, 3, 21).unwrap()],
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"2025-03-21\""));
    }
}
