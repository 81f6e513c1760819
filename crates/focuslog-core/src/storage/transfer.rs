//! Bulk export and import of day files.
//!
//! The exchange format is one JSON document mapping `YYYY-MM-DD` to the
//! sessions of that date.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::migrations;
use super::store::Storage;
use crate::error::StorageError;
use crate::tracking::DailySessions;

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: Vec<NaiveDate>,
    /// Dates that already existed and were left untouched.
    pub skipped: Vec<NaiveDate>,
}

impl Storage {
    /// Every stored day keyed by date.
    pub fn export_all(&self) -> Result<BTreeMap<String, DailySessions>, StorageError> {
        let mut out = BTreeMap::new();
        for date in self.available_days()? {
            out.insert(date.format("%Y-%m-%d").to_string(), self.load(date)?);
        }
        Ok(out)
    }

    /// Write every stored day to `path` as one JSON document. Returns the
    /// number of days written.
    pub fn export_to(&self, path: &Path) -> Result<usize, StorageError> {
        let days = self.export_all()?;
        let json = serde_json::to_vec_pretty(&days).map_err(StorageError::Serialize)?;
        std::fs::write(path, json).map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), days = days.len(), "exported days");
        Ok(days.len())
    }

    /// Save a full archive of the data directory to `path`.
    pub fn create_backup_archive(&self, path: &Path) -> Result<usize, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.export_to(path)
    }

    /// Import days from an export document. Existing days are skipped
    /// unless `overwrite` is set.
    ///
    /// # Errors
    /// Every key is validated before anything is written; a key that is not
    /// a `YYYY-MM-DD` date fails the whole import.
    pub fn import_from(&self, path: &Path, overwrite: bool) -> Result<ImportSummary, StorageError> {
        let raw = std::fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let days: BTreeMap<String, DailySessions> =
            serde_json::from_slice(&raw).map_err(|source| StorageError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        self.import_days(days, overwrite)
    }

    pub fn import_days(
        &self,
        days: BTreeMap<String, DailySessions>,
        overwrite: bool,
    ) -> Result<ImportSummary, StorageError> {
        let mut parsed = Vec::with_capacity(days.len());
        for (key, day) in days {
            let date = NaiveDate::parse_from_str(&key, "%Y-%m-%d")
                .map_err(|_| StorageError::InvalidImportDate(key.clone()))?;
            parsed.push((date, day));
        }

        let mut summary = ImportSummary::default();
        for (date, mut day) in parsed {
            if !overwrite && self.exists(date) {
                summary.skipped.push(date);
                continue;
            }
            day.date = date;
            migrations::migrate(&mut day, 0);
            self.save(&day)?;
            summary.imported.push(date);
        }

        tracing::debug!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            "imported days"
        );
        Ok(summary)
    }
}
