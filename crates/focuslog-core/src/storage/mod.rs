mod config;
pub mod crypto;
mod maintenance;
pub mod migrations;
mod query;
mod range;
mod store;
mod transfer;

pub use config::{Config, SecurityConfig, StorageConfig, TrackingConfig};
pub use crypto::Cipher;
pub use range::{DateRange, RangeKind};
pub use store::{file_name, Encryption, Storage, StorageOptions};
pub use transfer::ImportSummary;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focuslog[-dev]/` based on FOCUSLOG_ENV.
///
/// Set FOCUSLOG_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(".config");

    let env = std::env::var("FOCUSLOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focuslog-dev")
    } else {
        base_dir.join("focuslog")
    };

    Ok(dir)
}
