//! Per-day file storage.
//!
//! Each calendar date lives in `sessions_YYYY-MM-DD.json` under the data
//! directory. Files are wrapped with a schema version, optionally
//! encrypted, and backed up to `backups/` before being overwritten.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

use super::crypto::Cipher;
use super::migrations;
use crate::accounting::RecoveryPolicy;
use crate::error::StorageError;
use crate::tracking::DailySessions;

const FILE_PREFIX: &str = "sessions_";
const FILE_SUFFIX: &str = ".json";
const BACKUP_DIR: &str = "backups";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const KEY_FILE: &str = "storage.key";

/// How day files are encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Encryption {
    #[default]
    Disabled,
    /// Key derived from a passphrase.
    Passphrase(String),
    /// Random key kept in `storage.key` inside the data directory.
    GeneratedKey,
}

/// Resolved settings a [`Storage`] runs with.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub data_dir: PathBuf,
    pub backup_enabled: bool,
    /// Minimum age of the newest backup of a day before another is taken.
    /// Zero backs up on every overwrite.
    pub backup_interval_days: u32,
    pub encryption: Encryption,
    pub custom_tags: Vec<String>,
    pub recovery: RecoveryPolicy,
}

impl StorageOptions {
    /// Plain, unencrypted storage in `data_dir` without backups.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_enabled: false,
            backup_interval_days: 0,
            encryption: Encryption::Disabled,
            custom_tags: Vec::new(),
            recovery: RecoveryPolicy::default(),
        }
    }

    pub fn with_backups(mut self, interval_days: u32) -> Self {
        self.backup_enabled = true;
        self.backup_interval_days = interval_days;
        self
    }

    pub fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn with_custom_tags(mut self, tags: Vec<String>) -> Self {
        self.custom_tags = tags;
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }
}

/// File-backed store of [`DailySessions`], one file per date.
#[derive(Debug)]
pub struct Storage {
    options: StorageOptions,
    backup_dir: PathBuf,
    cipher: Option<Cipher>,
}

impl Storage {
    /// Open the store, creating the data and backup directories and
    /// preparing the encryption key.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created or the key cannot
    /// be derived, loaded or generated.
    pub fn open(options: StorageOptions) -> Result<Self, StorageError> {
        create_dir(&options.data_dir)?;
        let backup_dir = options.data_dir.join(BACKUP_DIR);
        if options.backup_enabled {
            create_dir(&backup_dir)?;
        }

        let cipher = match &options.encryption {
            Encryption::Disabled => None,
            Encryption::Passphrase(passphrase) => Some(Cipher::from_passphrase(passphrase)?),
            Encryption::GeneratedKey => {
                Some(Cipher::load_or_create(&options.data_dir.join(KEY_FILE))?)
            }
        };

        tracing::debug!(
            data_dir = %options.data_dir.display(),
            encrypted = cipher.is_some(),
            "opened storage"
        );

        Ok(Self {
            options,
            backup_dir,
            cipher,
        })
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn data_dir(&self) -> &Path {
        &self.options.data_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn recovery(&self) -> RecoveryPolicy {
        self.options.recovery
    }

    pub fn custom_tags(&self) -> &[String] {
        &self.options.custom_tags
    }

    pub fn file_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir().join(file_name(date))
    }

    fn backup_path(&self, date: NaiveDate, at: DateTime<Local>) -> PathBuf {
        self.backup_dir.join(format!(
            "{FILE_PREFIX}{}_backup_{}{FILE_SUFFIX}",
            date.format("%Y-%m-%d"),
            at.format(BACKUP_TIMESTAMP_FORMAT)
        ))
    }

    pub fn exists(&self, date: NaiveDate) -> bool {
        self.file_path(date).exists()
    }

    /// Load the sessions of `date`. A missing file yields an empty day.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, decrypted or parsed.
    pub fn load(&self, date: NaiveDate) -> Result<DailySessions, StorageError> {
        let path = self.file_path(date);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DailySessions::new(date));
            }
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        let plain = match &self.cipher {
            Some(cipher) => cipher.decrypt(&raw)?,
            None => raw,
        };

        let (mut day, version) =
            migrations::decode(&plain).map_err(|source| StorageError::Parse {
                path: path.clone(),
                source,
            })?;
        migrations::migrate(&mut day, version);
        day.date = date;

        tracing::debug!(path = %path.display(), sessions = day.sessions.len(), "loaded day");
        Ok(day)
    }

    /// Write `day` to its file, backing up the previous contents first when
    /// backups are enabled.
    ///
    /// # Errors
    /// Returns an error if the day cannot be serialized, encrypted or
    /// written. Backup failures are logged and do not fail the save.
    pub fn save(&self, day: &DailySessions) -> Result<(), StorageError> {
        let path = self.file_path(day.date);

        if self.options.backup_enabled {
            if let Err(e) = self.backup_existing(&path, day.date, Local::now()) {
                tracing::warn!(date = %day.date, error = %e, "backup failed, saving anyway");
            }
        }

        let json = migrations::encode(day).map_err(StorageError::Serialize)?;
        let bytes = match &self.cipher {
            Some(cipher) => cipher.encrypt(&json)?,
            None => json,
        };

        std::fs::write(&path, bytes).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), sessions = day.sessions.len(), "saved day");
        Ok(())
    }

    /// Copy the current file for `date` into the backup directory. Returns
    /// `false` when there was nothing to back up or the newest backup is
    /// still within the interval.
    fn backup_existing(
        &self,
        path: &Path,
        date: NaiveDate,
        now: DateTime<Local>,
    ) -> Result<bool, StorageError> {
        if !path.exists() {
            return Ok(false);
        }

        if self.options.backup_interval_days > 0 {
            if let Some(latest) = self.latest_backup(date)? {
                let interval = Duration::days(i64::from(self.options.backup_interval_days));
                if now.naive_local() - latest < interval {
                    return Ok(false);
                }
            }
        }

        create_dir(&self.backup_dir)?;
        let backup = self.backup_path(date, now);
        std::fs::copy(path, &backup).map_err(|source| StorageError::Write {
            path: backup.clone(),
            source,
        })?;
        tracing::debug!(path = %backup.display(), "backed up day");
        Ok(true)
    }

    /// Timestamp of the newest backup of `date`, read from backup file names.
    fn latest_backup(&self, date: NaiveDate) -> Result<Option<NaiveDateTime>, StorageError> {
        let entries = match std::fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::ListDays {
                    path: self.backup_dir.clone(),
                    source,
                })
            }
        };

        let prefix = format!("{FILE_PREFIX}{}_backup_", date.format("%Y-%m-%d"));
        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stamp = name.strip_prefix(&prefix)?.strip_suffix(FILE_SUFFIX)?;
                NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
            })
            .max())
    }

    /// Dates that have a day file, ascending.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be listed.
    pub fn available_days(&self) -> Result<Vec<NaiveDate>, StorageError> {
        let entries = std::fs::read_dir(self.data_dir()).map_err(|source| StorageError::ListDays {
            path: self.data_dir().to_path_buf(),
            source,
        })?;

        let mut days: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| parse_file_name(&entry.file_name().to_string_lossy()))
            .collect();
        days.sort();
        days.dedup();
        Ok(days)
    }
}

fn create_dir(path: &Path) -> Result<(), StorageError> {
    std::fs::create_dir_all(path).map_err(|source| StorageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// `sessions_YYYY-MM-DD.json`
pub fn file_name(date: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format("%Y-%m-%d"))
}

fn parse_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
