use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calibration::Calibration;
use crate::geometry::ScreenSize;
use crate::input::InputMode;
use crate::levels::{GameMode, Level};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub game_mode: GameMode,
    pub level: Level,
    pub input_mode: InputMode,
    pub screen_width: f64,
    pub screen_height: f64,
    pub max_duration_secs: u64,
    /// `None` means fingertip pixels are used as screen pixels.
    pub calibration: Option<Calibration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_mode: GameMode::CircleTheDots,
            level: Level::One,
            input_mode: InputMode::Mouse,
            screen_width: 1792.0,
            screen_height: 1008.0,
            max_duration_secs: 5 * 60,
            calibration: None,
        }
    }
}

impl Config {
    pub fn screen(&self) -> ScreenSize {
        ScreenSize::new(self.screen_width, self.screen_height)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "dotboard") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("dotboard_config.json")
        };
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

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) if !cfg.screen().is_valid() => {
                    log::warn!(
                        "ignoring config {}: screen size {}x{} is not positive",
                        self.path.display(),
                        cfg.screen_width,
                        cfg.screen_height
                    );
                    Config::default()
                }
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring invalid config {}: {}", self.path.display(), e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
