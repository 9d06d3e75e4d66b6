use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keydash";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/keydash`, or the platform data dir without `HOME`
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn stats_dir() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("stats"))
            .unwrap_or_else(|| PathBuf::from("stats"))
    }

    pub fn key_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("signing.key"))
            .unwrap_or_else(|| PathBuf::from("keydash_signing.key"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("keydash.log"))
            .unwrap_or_else(|| PathBuf::from("keydash.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("keydash_config.json"))
    }
}
