pub mod config;
pub mod data;
pub mod session;
pub mod stats;

use focuslog_core::{Config, Storage};
use std::path::PathBuf;

/// Configuration and paths shared by every command.
pub struct Context {
    pub config: Config,
    data_dir: Option<PathBuf>,
}

impl Context {
    pub fn load(
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) => Config::load_from(&path)?,
            None => Config::load()?,
        };
        Ok(Self { config, data_dir })
    }

    pub fn storage(&self) -> Result<Storage, Box<dyn std::error::Error>> {
        let options = self.config.storage_options(self.data_dir.as_deref())?;
        tracing::debug!(
            data_dir = %options.data_dir.display(),
            backups = options.backup_enabled,
            "resolved storage options"
        );
        Ok(Storage::open(options)?)
    }
}
