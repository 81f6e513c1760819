//! Editing stored days: merge and delete sessions.

use chrono::NaiveDate;

use super::store::Storage;
use crate::error::Result;
use crate::tracking::Session;

impl Storage {
    /// Merge sessions `a` and `b` of `date` and save the day. Returns the
    /// merged session.
    ///
    /// # Errors
    /// Out-of-range or equal indices are rejected before the day is changed.
    pub fn merge_sessions(&self, date: NaiveDate, a: usize, b: usize) -> Result<Session> {
        let mut day = self.load(date)?;
        let merged = day.merge(a, b)?.clone();
        self.save(&day)?;
        tracing::debug!(%date, a, b, id = %merged.id, "merged sessions");
        Ok(merged)
    }

    /// Delete session `index` of `date` and save the day. Returns the removed
    /// session.
    pub fn delete_session(&self, date: NaiveDate, index: usize) -> Result<Session> {
        let mut day = self.load(date)?;
        let removed = day.remove(index)?;
        self.save(&day)?;
        tracing::debug!(%date, index, id = %removed.id, "deleted session");
        Ok(removed)
    }
}
