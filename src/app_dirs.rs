use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "bellboard";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `~/.local/state/bellboard` when HOME is set, the platform data dir
    /// otherwise.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn state_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("state.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("bellboard.log"))
    }
}
