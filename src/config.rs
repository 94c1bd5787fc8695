use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, PersistError},
    monitor::DEFAULT_TICK_INTERVAL,
    time_codec::Convention,
    trigger::{TriggerHandler, DEFAULT_SNOOZE_MINUTES},
};

const APP_NAME: &str = "roosty_reminder";

#[inline]
#[must_use]
pub const fn default_volume() -> f32 {
    100.0
}

#[must_use]
pub fn default_time_format() -> String {
    Convention::TwentyFourHour.to_string()
}

#[must_use]
pub const fn default_tick_interval_secs() -> u64 {
    DEFAULT_TICK_INTERVAL.as_secs()
}

#[must_use]
pub fn default_snooze_minutes() -> Vec<u32> {
    DEFAULT_SNOOZE_MINUTES.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `"12"` or `"24"`, used when editing and listing alarms
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: Vec<u32>,
    /// sound file played when an alarm rings, a beep when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<PathBuf>,
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// where alarms are saved, the data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarms_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            tick_interval_secs: default_tick_interval_secs(),
            snooze_minutes: default_snooze_minutes(),
            sound: None,
            volume: default_volume(),
            alarms_file: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the config file, falling back to the defaults when it is missing
    /// or broken.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(ConfigError::Persist(PersistError::Io { source, .. }))
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::info!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}, using default config");
                Self::default()
            }
        }
    }

    /// # Errors
    /// Fails when the file can't be read or isn't a valid config.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&config).map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// # Errors
    /// Fails on serialization or filesystem errors.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self).map_err(PersistError::from)?;
        let io_err = |source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, config).map_err(io_err)?;
        Ok(())
    }

    /// # Errors
    /// Fails when the platform has no home directory.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    /// # Errors
    /// Fails when the platform has no home directory.
    pub fn default_alarms_path() -> Result<PathBuf, ConfigError> {
        let mut path = project_dirs()?.data_dir().to_path_buf();
        path.push("alarms.toml");
        Ok(path)
    }

    /// The configured alarms file, or the default one.
    ///
    /// # Errors
    /// Fails when no file is configured and there is no home directory.
    pub fn alarms_path(&self) -> Result<PathBuf, ConfigError> {
        self.alarms_file
            .clone()
            .map_or_else(Self::default_alarms_path, Ok)
    }

    #[must_use]
    pub fn convention(&self) -> Convention {
        Convention::from_token(&self.time_format)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    #[must_use]
    pub fn trigger_handler(&self) -> TriggerHandler {
        TriggerHandler::new(self.snooze_minutes.iter().copied())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoProjectDirs)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(30));
        assert_eq!(config.convention(), Convention::TwentyFourHour);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "time_format = \"12\"\nsnooze_minutes = [15]\n").unwrap();
        let config = Config::load(&path);
        assert_eq!(config.convention(), Convention::TwelveHour);
        assert_eq!(config.trigger_handler().snooze_options(), [15]);
        assert_eq!(config.tick_interval_secs, 30);
        assert!((config.volume - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn broken_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_interval_secs = \"soon\"").unwrap();
        assert_eq!(Config::load(&path), Config::default());
        assert!(matches!(
            Config::try_load(&path),
            Err(ConfigError::Persist(PersistError::Decode { .. }))
        ));
        assert!(matches!(
            Config::try_load(&dir.path().join("missing.toml")),
            Err(ConfigError::Persist(PersistError::Io { .. }))
        ));
    }

    #[test]
    fn save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let config = Config {
            alarms_file: Some(dir.path().join("alarms.toml")),
            tick_interval_secs: 5,
            ..Config::default()
        };
        config.save(&path).unwrap();
        let loaded = Config::load(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.alarms_path().unwrap(), dir.path().join("alarms.toml"));
    }
}
