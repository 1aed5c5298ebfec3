// historysync Settings Engine
// Loads poller settings from an optional JSON file, then applies environment
// overrides. Only the file layer is ever written back to disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::SyncSettings;

pub const ENV_ENDPOINT: &str = "HISTORYSYNC_ENDPOINT";
/// Legacy name for the endpoint, still honoured.
pub const ENV_DOMAIN: &str = "DOMAIN";
pub const ENV_HISTORY_DB: &str = "HISTORYSYNC_HISTORY_DB";
pub const ENV_STATE_PATH: &str = "HISTORYSYNC_STATE_PATH";
pub const ENV_POLL_SECS: &str = "HISTORYSYNC_POLL_SECS";
pub const ENV_WINDOW_SECS: &str = "HISTORYSYNC_WINDOW_SECS";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<SyncSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &SyncSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

pub struct SettingsEngine {
    config_path: PathBuf,
    /// The file layer; environment overrides are applied on top in `load`.
    settings: SyncSettings,
}

impl SettingsEngine {
    /// Uses `path_override` when given, otherwise `<data dir>/settings.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_data_dir().join("settings.json"));
        Self {
            config_path,
            settings: SyncSettings::default(),
        }
    }

    /// Reads the file layer into memory. A missing file means defaults.
    pub fn load_file(&mut self) -> Result<(), SettingsError> {
        if !self.config_path.exists() {
            self.settings = SyncSettings::default();
            return Ok(());
        }
        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SettingsError::Io(format!("Failed to read config file: {}", e)))?;
        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::Serialization(format!("Failed to parse config file: {}", e))
        })?;
        Ok(())
    }

    /// Applies overrides from `lookup` (normally the process environment) to
    /// the file layer and reconciles the sync window with the poll interval.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<SyncSettings, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut resolved = self.settings.clone();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(endpoint) = var(ENV_ENDPOINT).or_else(|| var(ENV_DOMAIN)) {
            resolved.endpoint = Some(endpoint);
        }
        if let Some(path) = var(ENV_HISTORY_DB) {
            resolved.history_db = PathBuf::from(path);
        }
        if let Some(path) = var(ENV_STATE_PATH) {
            resolved.state_path = PathBuf::from(path);
        }
        if let Some(secs) = var(ENV_POLL_SECS) {
            resolved.poll_interval_secs = parse_secs(ENV_POLL_SECS, &secs)?;
        }
        if let Some(secs) = var(ENV_WINDOW_SECS) {
            resolved.window_secs = parse_secs(ENV_WINDOW_SECS, &secs)?;
        }

        if resolved.poll_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        // A window shorter than the poll interval would skip visits between cycles.
        if resolved.window_secs < resolved.poll_interval_secs {
            warn!(
                window_secs = resolved.window_secs,
                poll_interval_secs = resolved.poll_interval_secs,
                "sync window shorter than poll interval; widening it"
            );
            resolved.window_secs = resolved.poll_interval_secs;
        }
        Ok(resolved)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, SettingsError> {
    value
        .parse()
        .map_err(|_| SettingsError::InvalidValue(format!("{} must be a number of seconds, got '{}'", key, value)))
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads the file layer and returns the effective settings.
    fn load(&mut self) -> Result<SyncSettings, SettingsError> {
        self.load_file()?;
        self.resolve_with(|key| env::var(key).ok())
    }

    /// Saves the file layer as pretty JSON, creating parent directories.
    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::Serialization(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(&self.config_path, json)
            .map_err(|e| SettingsError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Returns the file layer, without environment overrides.
    fn get_settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Updates one top-level setting, validates it by round-tripping through
    /// `SyncSettings`, and saves.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::Serialization(format!("Failed to serialize settings: {}", e))
        })?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidValue(format!(
                    "Key '{}' not found in settings",
                    key
                )))
            }
        }

        self.settings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = SyncSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
