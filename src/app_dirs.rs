use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("dotboard"),
            )
        } else {
            ProjectDirs::from("", "", "dotboard").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn history_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("history.db"))
    }

    /// Per-session JSON summaries and trajectory CSVs.
    pub fn session_log_dir() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("logs"))
    }

    pub fn log_file_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("dotboard.log"))
    }
}
