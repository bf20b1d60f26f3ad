use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::alerts::dispatch::NotificationStyle;
use super::alerts::engine::EngineConfig;
use super::alerts::model::Alert;
use super::error::ConfigError;

/// Application settings: the persisted alert set plus engine options.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub alerts: Vec<Alert>,
    /// Groups known to the alert list, including empty ones
    pub alert_groups: Vec<String>,
    /// Intel channels watched for liveness
    pub intel_channels: Vec<String>,
    pub use_jump_bridges: bool,
    pub translate_pings: bool,
    pub system_notification: NotificationStyle,
    pub tick_interval_millis: u64,
    /// Root of the bundled sound files
    pub sound_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alerts: Vec::new(),
            alert_groups: Vec::new(),
            intel_channels: Vec::new(),
            use_jump_bridges: false,
            translate_pings: false,
            system_notification: NotificationStyle::default(),
            tick_interval_millis: 1000,
            sound_dir: None,
        }
    }
}

impl Settings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            use_jump_bridges: self.use_jump_bridges,
            translate_pings: self.translate_pings,
            notification: self.system_notification.clone(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
        }
    }

    /// Point at a specific settings file instead of `settings.json` in a directory.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load settings, falling back to defaults when the file is missing or invalid.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!(
                    "Could not load {}, using defaults: {}",
                    self.config_path.display(),
                    e
                );
                Settings::default()
            }
        }
    }

    /// Like `load`, but reports why a present file could not be used.
    pub fn try_load(&self) -> Result<Option<Settings>, ConfigError> {
        if !self.config_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.config_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::model::{AlertAction, AlertTrigger, IntelChannel};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().to_path_buf());

        let default = manager.load();
        assert_eq!(default.tick_interval_millis, 1000);
        assert_eq!(default.system_notification.timeout_seconds, 8);

        let new_settings = Settings {
            alerts: vec![Alert {
                id: "quiet".to_string(),
                is_enabled: true,
                group: Some("intel".to_string()),
                trigger: AlertTrigger::NoChannelActivity {
                    channel: IntelChannel::All,
                    duration_seconds: 300,
                },
                actions: vec![AlertAction::Sound { id: 6 }],
                cooldown_seconds: 60,
            }],
            alert_groups: vec!["intel".to_string()],
            intel_channels: vec!["delve.imperium".to_string()],
            use_jump_bridges: true,
            ..Settings::default()
        };

        manager.save(&new_settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded, new_settings);
        assert!(loaded.engine_config().use_jump_bridges);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"translate_pings": true}"#).unwrap();

        let settings = ConfigManager::with_path(path).load();
        assert!(settings.translate_pings);
        assert!(settings.alerts.is_empty());
        assert_eq!(settings.tick_interval_millis, 1000);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().to_path_buf());
        fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

        assert!(matches!(manager.try_load(), Err(ConfigError::Json(_))));
        assert_eq!(manager.load(), Settings::default());
    }
}
