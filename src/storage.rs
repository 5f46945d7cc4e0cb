use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerts::AlertConfig;
use crate::countdown::DEFAULT_PRESETS_MIN;

const APP_NAME: &str = "countdown";
const CONFIG_NAME: &str = "preferences";
pub const DEFAULT_POLL_MS: u64 = 200;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to load preferences")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save preferences")]
    Save(#[source] confy::ConfyError),
}

/// User preferences. Timer state itself is never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    #[serde(default = "default_presets")]
    pub presets_min: Vec<u32>,
    #[serde(default)]
    pub last_duration_ms: u64,
}

fn default_poll_ms() -> u64 {
    DEFAULT_POLL_MS
}

fn default_presets() -> Vec<u32> {
    DEFAULT_PRESETS_MIN.to_vec()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            alerts: AlertConfig::default(),
            poll_ms: DEFAULT_POLL_MS,
            presets_min: default_presets(),
            last_duration_ms: 0,
        }
    }
}

pub struct TimerStorage {
    path: Option<PathBuf>,
}

impl TimerStorage {
    /// Preferences in the platform config directory.
    pub fn new() -> Self {
        Self { path: None }
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn try_load(&self) -> Result<Preferences, StorageError> {
        let prefs = match &self.path {
            Some(path) => confy::load_path(path)?,
            None => confy::load(APP_NAME, CONFIG_NAME)?,
        };
        Ok(prefs)
    }

    /// Load, falling back to defaults on any error.
    pub fn load_preferences(&self) -> Preferences {
        self.try_load().unwrap_or_else(|e| {
            log::warn!("{}, using defaults: {:?}", e, e);
            Preferences::default()
        })
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<(), StorageError> {
        match &self.path {
            Some(path) => confy::store_path(path, prefs),
            None => confy::store(APP_NAME, CONFIG_NAME, prefs),
        }
        .map_err(StorageError::Save)?;
        log::debug!("preferences saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("countdown-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.poll_ms, 200);
        assert_eq!(prefs.presets_min, vec![1, 3, 5, 10, 25]);
        assert!(prefs.alerts.sound && prefs.alerts.vibration && prefs.alerts.title_flash);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let storage = TimerStorage::at_path(scratch("missing.yml"));
        assert_eq!(storage.load_preferences(), Preferences::default());
    }

    #[test]
    fn test_saved_preferences_are_loaded() {
        let storage = TimerStorage::at_path(scratch("saved.yml"));
        let prefs = Preferences {
            alerts: AlertConfig { sound: false, vibration: true, title_flash: false },
            poll_ms: 100,
            presets_min: vec![2, 45],
            last_duration_ms: 90_000,
        };
        storage.save_preferences(&prefs).unwrap();
        assert_eq!(storage.try_load().unwrap(), prefs);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = scratch("partial.yml");
        std::fs::write(&path, "last_duration_ms: 5000\n").unwrap();
        let prefs = TimerStorage::at_path(path).try_load().unwrap();
        assert_eq!(prefs.last_duration_ms, 5_000);
        assert_eq!(prefs.poll_ms, DEFAULT_POLL_MS);
        assert_eq!(prefs.alerts, AlertConfig::default());
    }
}
