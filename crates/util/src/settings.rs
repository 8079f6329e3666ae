//! Persisted settings for the Roomcast CLI.
//!
//! A small JSON document holds the global routine defaults, the native shortcut tables, and
//! player options. It lives in the standard configuration directory
//! (`~/.config/roomcast/config.json` on most platforms) unless `ROOMCAST_CONFIG_PATH` or an
//! explicit path says otherwise.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dirs_next::config_dir;
use roomcast_types::{NativeShortcuts, RoutineDefaults, ValidationError, validate_defaults};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "ROOMCAST_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "config.json";

/// Player application driven by the airplay backend when none is configured.
pub const DEFAULT_PLAYER_APP: &str = "Music";

/// Error surfaced when reading or writing settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("settings I/O error")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("settings serialization error")]
    Serialization(#[from] serde_json::Error),
    #[error("unknown settings key '{0}' (expected one of: {keys})", keys = SettingKey::NAMES.join(", "))]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("invalid settings")]
    Invalid(#[from] ValidationError),
}

/// Persisted settings payload.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Global routine defaults, applied below routine-level defaults.
    #[serde(default, skip_serializing_if = "RoutineDefaults::is_empty")]
    pub defaults: RoutineDefaults,
    /// Shortcut tables for the native backend.
    #[serde(default)]
    pub native: NativeShortcuts,
    /// Options for the airplay backend.
    #[serde(default)]
    pub airplay: AirplaySettings,
}

/// Options for the airplay backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AirplaySettings {
    /// Player application addressed by the scripting bridge.
    #[serde(default = "default_player_app")]
    pub app: String,
}

impl Default for AirplaySettings {
    fn default() -> Self {
        Self { app: default_player_app() }
    }
}

fn default_player_app() -> String {
    DEFAULT_PLAYER_APP.to_string()
}

/// Keys editable through `config get/set/unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Backend,
    Rooms,
    Volume,
    Shuffle,
}

impl SettingKey {
    pub const NAMES: [&'static str; 4] = ["defaults.backend", "defaults.rooms", "defaults.volume", "defaults.shuffle"];
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "defaults.backend" | "backend" => Ok(Self::Backend),
            "defaults.rooms" | "rooms" => Ok(Self::Rooms),
            "defaults.volume" | "volume" => Ok(Self::Volume),
            "defaults.shuffle" | "shuffle" => Ok(Self::Shuffle),
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }
}

/// Settings backed by a JSON file.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Open the store at `path`, or at the default location when `path` is `None`.
    ///
    /// A missing file yields empty settings. A file that cannot be parsed is reported with a
    /// warning and treated as empty so routines can still run.
    pub fn open(path: Option<PathBuf>) -> Result<Self, SettingsError> {
        let resolved_path = path.unwrap_or_else(default_settings_path);
        let settings = load_settings(&resolved_path)?;
        Ok(Self {
            path: resolved_path,
            settings,
        })
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Global defaults applied beneath routine-level defaults.
    pub fn defaults(&self) -> &RoutineDefaults {
        &self.settings.defaults
    }

    /// Render the current value of `key`, `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let defaults = &self.settings.defaults;
        let value = match key.parse::<SettingKey>()? {
            SettingKey::Backend => Some(defaults.backend.clone()).filter(|backend| !backend.is_empty()),
            SettingKey::Rooms => Some(defaults.rooms.join(",")).filter(|rooms| !rooms.is_empty()),
            SettingKey::Volume => defaults.volume.map(|volume| volume.to_string()),
            SettingKey::Shuffle => defaults.shuffle.map(|shuffle| shuffle.to_string()),
        };
        Ok(value)
    }

    /// Assign `key` and persist the file.
    pub fn set(&mut self, key: &str, raw_value: &str) -> Result<(), SettingsError> {
        let key_name = key.trim().to_string();
        let invalid = |message: &str| SettingsError::InvalidValue {
            key: key_name.clone(),
            message: message.to_string(),
        };

        let mut defaults = self.settings.defaults.clone();
        match key.parse::<SettingKey>()? {
            SettingKey::Backend => defaults.backend = raw_value.trim().to_string(),
            SettingKey::Rooms => {
                defaults.rooms = raw_value
                    .split(',')
                    .map(str::trim)
                    .filter(|room| !room.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            SettingKey::Volume => {
                let volume = raw_value.trim().parse::<i64>().map_err(|_| invalid("expected an integer"))?;
                defaults.volume = Some(volume);
            }
            SettingKey::Shuffle => {
                let shuffle = raw_value.trim().parse::<bool>().map_err(|_| invalid("expected true or false"))?;
                defaults.shuffle = Some(shuffle);
            }
        }
        validate_defaults(&defaults, "defaults")?;

        self.settings.defaults = defaults;
        self.save()
    }

    /// Clear `key` and persist the file.
    pub fn unset(&mut self, key: &str) -> Result<(), SettingsError> {
        let defaults = &mut self.settings.defaults;
        match key.parse::<SettingKey>()? {
            SettingKey::Backend => defaults.backend.clear(),
            SettingKey::Rooms => defaults.rooms.clear(),
            SettingKey::Volume => defaults.volume = None,
            SettingKey::Shuffle => defaults.shuffle = None,
        }
        self.save()
    }

    /// Write the settings file, creating parent directories as needed.
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Default settings location, honouring [`SETTINGS_PATH_ENV`].
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roomcast")
        .join(SETTINGS_FILE_NAME)
}

fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str::<Settings>(&data) {
            Ok(settings) => {
                if let Err(error) = validate_defaults(&settings.defaults, "defaults") {
                    warn!(path = %path.display(), error = %error, "Persisted defaults are invalid; ignoring them");
                    return Ok(Settings {
                        defaults: RoutineDefaults::default(),
                        ..settings
                    });
                }
                Ok(settings)
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(Settings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}
