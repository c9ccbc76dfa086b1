use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::posture::PostureConfig;
use crate::scoring::ScoringConfig;

/// Every tunable threshold of the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub scoring: ScoringConfig,
    pub posture: PostureConfig,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<EngineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            load_or_default(&path)
        } else {
            EngineSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Result<EngineSettings> {
        Ok(self.read()?.clone())
    }

    pub fn scoring(&self) -> Result<ScoringConfig> {
        Ok(self.read()?.scoring.clone())
    }

    pub fn posture(&self) -> Result<PostureConfig> {
        Ok(self.read()?.posture.clone())
    }

    pub fn update_scoring(&self, scoring: ScoringConfig) -> Result<()> {
        let mut guard = self.write()?;
        guard.scoring = scoring;
        self.persist(&guard)
    }

    pub fn update_posture(&self, posture: PostureConfig) -> Result<()> {
        let mut guard = self.write()?;
        guard.posture = posture;
        self.persist(&guard)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, EngineSettings>> {
        self.data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, EngineSettings>> {
        self.data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn persist(&self, data: &EngineSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// Any file that cannot be read or parsed yields the defaults.
fn load_or_default(path: &Path) -> EngineSettings {
    let parsed = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))
        .and_then(|contents| {
            serde_json::from_str::<EngineSettings>(&contents)
                .with_context(|| format!("Failed to parse settings at {}", path.display()))
        });
    match parsed {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("Ignoring unreadable settings: {err:#}");
            EngineSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{MotionGuard, SimilarityStrategy};

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.settings().unwrap(), EngineSettings::default());
    }

    #[test]
    fn updates_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut scoring = store.scoring().unwrap();
        scoring.strategy = SimilarityStrategy::Angle;
        scoring.motion_guard = MotionGuard::RangeOfMotion { min_degrees: 25.0 };
        store.update_scoring(scoring.clone()).unwrap();

        let mut posture = store.posture().unwrap();
        posture.alert_after_secs = 30.0;
        store.update_posture(posture).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.scoring().unwrap(), scoring);
        assert_eq!(reopened.posture().unwrap().alert_after_secs, 30.0);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.settings().unwrap(), EngineSettings::default());
    }

    #[test]
    fn settings_path_that_cannot_be_read_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::create_dir(&path).unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.settings().unwrap(), EngineSettings::default());
    }

    #[test]
    fn motion_guard_fields_are_camel_case_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let mut scoring = store.scoring().unwrap();
        scoring.motion_guard = MotionGuard::RangeOfMotion { min_degrees: 30.0 };
        store.update_scoring(scoring).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"minDegrees\": 30.0"));
        assert!(!written.contains("min_degrees"));

        fs::write(
            &path,
            r#"{"scoring": {"motionGuard": {"kind": "hipDisplacement", "minTotal": 0.3}}}"#,
        )
        .unwrap();
        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(
            reopened.scoring().unwrap().motion_guard,
            MotionGuard::HipDisplacement { min_total: 0.3 }
        );
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"posture": {"tiltThreshold": 0.08}}"#).unwrap();
        let store = SettingsStore::new(path).unwrap();
        let posture = store.posture().unwrap();
        assert_eq!(posture.tilt_threshold, 0.08);
        assert_eq!(posture.alert_after_secs, 20.0);
        assert_eq!(store.scoring().unwrap(), ScoringConfig::default());
    }
}
