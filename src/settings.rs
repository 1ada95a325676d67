use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::monitor::DEFAULT_CHECK_INTERVAL_SECS;
use crate::sources::Browser;

pub const POLL_INTERVAL_ENV: &str = "SURVEY_POLL_INTERVAL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub poll_interval_secs: u64,
    pub browsers: Vec<Browser>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            browsers: Browser::ALL.to_vec(),
        }
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Applies `SURVEY_POLL_INTERVAL` when it holds a positive number of seconds.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = env::var(POLL_INTERVAL_ENV) {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.poll_interval_secs = secs,
                _ => log::warn!("ignoring invalid {POLL_INTERVAL_ENV}={value:?}"),
            }
        }
        self
    }
}

/// Monitor settings backed by a JSON file. A missing or unreadable file
/// falls back to defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<MonitorSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("invalid settings in {}, using defaults: {err}", path.display());
                MonitorSettings::default()
            })
        } else {
            MonitorSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> MonitorSettings {
        self.read().clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.read().poll_interval()
    }

    pub fn update_poll_interval(&self, secs: u64) -> Result<()> {
        if secs == 0 {
            bail!("poll interval must be at least one second");
        }
        let mut guard = self.write();
        guard.poll_interval_secs = secs;
        self.persist(&guard)
    }

    /// Re-reads the file. Returns true when the settings changed.
    pub fn reload(&self) -> Result<bool> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: MonitorSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        let mut guard = self.write();
        let changed = *guard != data;
        *guard = data;
        Ok(changed)
    }

    fn persist(&self, data: &MonitorSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, MonitorSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, MonitorSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.settings(), MonitorSettings::default());
        assert_eq!(store.poll_interval(), Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "poll_interval_secs": 12 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.poll_interval_secs, 12);
        assert_eq!(settings.browsers, Browser::ALL.to_vec());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(SettingsStore::new(path).unwrap().settings(), MonitorSettings::default());
    }

    #[test]
    fn updated_interval_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store.update_poll_interval(30).unwrap();
        assert!(store.update_poll_interval(0).is_err());

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.poll_interval(), Duration::from_secs(30));

        fs::write(&path, r#"{ "poll_interval_secs": 9, "browsers": ["safari"] }"#).unwrap();
        assert!(reopened.reload().unwrap());
        assert!(!reopened.reload().unwrap());
        assert_eq!(reopened.settings().browsers, vec![Browser::Safari]);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let settings = MonitorSettings {
            poll_interval_secs: 0,
            ..MonitorSettings::default()
        };
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
    }
}
