use crate::app_dirs::AppDirs;
use crate::beats::BeatMetadata;
use crate::error::Result;
use crate::session::DEFAULT_WORD_DISPLAY;
use crate::timing::{Bpm, Frequency};
use crate::words::Difficulty;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Preferences remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub last_beat_id: Option<String>,
    pub frequency: Frequency,
    pub difficulty: Difficulty,
    pub word_display_ms: u64,
    pub words_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_beat_id: None,
            frequency: Frequency::default(),
            difficulty: Difficulty::default(),
            word_display_ms: DEFAULT_WORD_DISPLAY.as_millis() as u64,
            words_file: None,
        }
    }
}

/// Settings for one practice run, after merging CLI flags over saved preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSettings {
    pub beat: BeatMetadata,
    pub bpm: Bpm,
    pub frequency: Frequency,
    pub difficulty: Difficulty,
    pub duration_secs: Option<f64>,
    pub word_display: Duration,
    pub words_file: Option<PathBuf>,
}

impl From<&PracticeSettings> for Config {
    fn from(s: &PracticeSettings) -> Self {
        Self {
            last_beat_id: Some(s.beat.id.clone()),
            frequency: s.frequency,
            difficulty: s.difficulty,
            word_display_ms: s.word_display.as_millis() as u64,
            words_file: s.words_file.clone(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("flowforge_config.json"));
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
    /// Missing or unreadable preferences fall back to defaults.
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring invalid config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
