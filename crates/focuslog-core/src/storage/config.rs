//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Data directory and backup policy
//! - Encryption settings
//! - Recovery time and custom interruption tags
//!
//! Configuration is stored at `~/.config/focuslog/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::config_dir;
use super::store::{Encryption, StorageOptions};
use crate::accounting::{RecoveryPolicy, DEFAULT_RECOVERY_MINUTES};
use crate::error::ConfigError;

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the day files. Defaults to `data/` next to the
    /// config file.
    #[serde(default)]
    pub data_directory: Option<String>,
    #[serde(default = "default_true")]
    pub backup_enabled: bool,
    #[serde(default = "default_backup_interval_days")]
    pub backup_interval_days: u32,
}

/// Encryption configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub enable_encryption: bool,
    /// Passphrase. When encryption is enabled without one, a random key is
    /// generated and kept in the data directory.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

/// Tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_recovery_minutes")]
    pub recovery_minutes: u32,
    #[serde(default)]
    pub custom_interruption_tags: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focuslog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    /// File this config was loaded from.
    #[serde(skip)]
    path: Option<PathBuf>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_backup_interval_days() -> u32 {
    7
}
fn default_recovery_minutes() -> u32 {
    DEFAULT_RECOVERY_MINUTES as u32
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            backup_enabled: true,
            backup_interval_days: default_backup_interval_days(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            recovery_minutes: default_recovery_minutes(),
            custom_interruption_tags: Vec::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Array(_) => {
                        // Accept a JSON array or a comma-separated list.
                        if value.trim_start().starts_with('[') {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        } else {
                            serde_json::Value::Array(
                                value
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(|s| serde_json::Value::String(s.to_string()))
                                    .collect(),
                            )
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    // Optional fields clear on an empty value.
                    serde_json::Value::String(_) | serde_json::Value::Null
                        if value.is_empty() =>
                    {
                        serde_json::Value::Null
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location, `~/.config/focuslog[-dev]/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from the default location or create it with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing a default config there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut cfg: Config =
                    toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.path = Some(path.to_path_buf());
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut cfg = Self::default();
                cfg.save_to(path)?;
                cfg.path = Some(path.to_path_buf());
                tracing::debug!(path = %path.display(), "created default config");
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to the file this config was loaded from, or the default
    /// location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Self::default_path()?,
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };

        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let path = self.path.take();
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        self.path = path;
        Ok(())
    }

    /// Flattened `key = value` pairs for every leaf setting.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                serde_json::Value::Null => out.push((prefix.to_string(), String::new())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::from_minutes(i64::from(self.tracking.recovery_minutes))
    }

    /// Resolve the options the storage layer runs with. `override_dir`
    /// takes precedence over the configured data directory.
    pub fn storage_options(
        &self,
        override_dir: Option<&Path>,
    ) -> Result<StorageOptions, ConfigError> {
        let data_dir = match (override_dir, &self.storage.data_directory) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.base_dir()?.join("data"),
        };

        let encryption = match (
            self.security.enable_encryption,
            self.security.encryption_key.as_deref(),
        ) {
            (false, _) => Encryption::Disabled,
            (true, Some(key)) if !key.is_empty() => Encryption::Passphrase(key.to_string()),
            (true, _) => Encryption::GeneratedKey,
        };

        Ok(StorageOptions {
            data_dir,
            backup_enabled: self.storage.backup_enabled,
            backup_interval_days: self.storage.backup_interval_days,
            encryption,
            custom_tags: self.tracking.custom_interruption_tags.clone(),
            recovery: self.recovery_policy(),
        })
    }

    fn base_dir(&self) -> Result<PathBuf, ConfigError> {
        match self.path.as_deref().and_then(Path::parent) {
            Some(parent) => Ok(parent.to_path_buf()),
            None => config_dir(),
        }
    }
}
