//! Session lifecycle over today's stored sessions.
//!
//! Every command validates against a copy of the day, saves it, and only
//! then replaces the in-memory state, so a rejected command or a failed
//! save leaves the tracker unchanged.

use chrono::{DateTime, Local, NaiveDate};

use super::daily::DailySessions;
use super::entry::{EntryType, InterruptionTag, TimeEntry};
use super::session::Session;
use crate::accounting::{daily_totals, Totals};
use crate::error::{Result, ValidationError};
use crate::storage::Storage;

#[derive(Debug)]
pub struct Tracker {
    storage: Storage,
    today: DailySessions,
}

impl Tracker {
    /// Open today's sessions.
    pub fn open(storage: Storage) -> Result<Self> {
        Self::open_on(storage, Local::now().date_naive())
    }

    /// Open the sessions of `date`, carrying over a session still active
    /// on the previous day.
    pub fn open_on(storage: Storage, date: NaiveDate) -> Result<Self> {
        let today = storage.load(date)?;
        let mut tracker = Self { storage, today };
        tracker.carry_over()?;
        Ok(tracker)
    }

    fn carry_over(&mut self) -> Result<()> {
        if self.today.active_index().is_some() {
            return Ok(());
        }
        let Some(previous) = self.today.date.pred_opt() else {
            return Ok(());
        };

        let mut yesterday = match self.storage.load(previous) {
            Ok(day) => day,
            Err(e) => {
                tracing::warn!(date = %previous, error = %e, "cannot check previous day for an active session");
                return Ok(());
            }
        };
        let Some(index) = yesterday.active_index() else {
            return Ok(());
        };

        let session = yesterday.remove(index)?;
        let mut today = self.today.clone();
        today.sessions.push(session);

        // Today first: a failure in between leaves the session in both days.
        self.storage.save(&today)?;
        self.today = today;
        self.storage.save(&yesterday)?;
        tracing::debug!(from = %previous, to = %self.today.date, "carried over active session");
        Ok(())
    }

    fn update<T>(
        &mut self,
        apply: impl FnOnce(&mut DailySessions) -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        let mut day = self.today.clone();
        let out = apply(&mut day)?;
        self.storage.save(&day)?;
        self.today = day;
        Ok(out)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn day(&self) -> &DailySessions {
        &self.today
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.today.active_session()
    }

    pub fn totals(&self, now: DateTime<Local>) -> Totals {
        daily_totals(&self.today, now)
    }

    /// Start a new session. Returns its index.
    pub fn start(&mut self, description: Option<String>, at: DateTime<Local>) -> Result<usize> {
        self.update(|day| {
            if day.active_index().is_some() {
                return Err(ValidationError::SessionAlreadyActive);
            }
            day.sessions
                .push(Session::new(TimeEntry::new(EntryType::Start, at, description)));
            Ok(day.sessions.len() - 1)
        })
    }

    pub fn interrupt(
        &mut self,
        tag: InterruptionTag,
        description: Option<String>,
        at: DateTime<Local>,
    ) -> Result<()> {
        self.update(|day| {
            day.active_session_mut()
                .ok_or(ValidationError::NoActiveSession)?
                .interrupt(TimeEntry::interruption(at, tag, description))
        })
    }

    pub fn return_from_interruption(&mut self, at: DateTime<Local>) -> Result<()> {
        self.update(|day| {
            day.active_session_mut()
                .ok_or(ValidationError::NoActiveSession)?
                .return_from_interruption(TimeEntry::new(EntryType::Return, at, None))
        })
    }

    pub fn end(&mut self, at: DateTime<Local>) -> Result<()> {
        self.update(|day| {
            day.active_session_mut()
                .ok_or(ValidationError::NoActiveSession)?
                .end(TimeEntry::new(EntryType::End, at, None))
        })
    }

    /// Reopen the completed session at `index`.
    pub fn resume(&mut self, index: usize, at: DateTime<Local>) -> Result<()> {
        self.update(|day| {
            if day.session(index)?.is_active() {
                return Err(ValidationError::SessionNotEnded(index));
            }
            if day.active_index().is_some() {
                return Err(ValidationError::SessionAlreadyActive);
            }
            day.session_mut(index)?
                .resume(TimeEntry::new(EntryType::Start, at, None))
        })
    }

    /// Change the description of the active session.
    pub fn rename(&mut self, description: Option<String>) -> Result<()> {
        self.update(|day| {
            day.active_session_mut()
                .ok_or(ValidationError::NoActiveSession)?
                .rename(description);
            Ok(())
        })
    }

    pub fn delete(&mut self, index: usize) -> Result<Session> {
        self.update(|day| day.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::StorageOptions;
    use chrono::{Duration, TimeZone};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn tracker(dir: &tempfile::TempDir) -> Tracker {
        let storage = Storage::open(StorageOptions::new(dir.path())).unwrap();
        Tracker::open_on(storage, date()).unwrap()
    }

    fn validation(err: CoreError) -> ValidationError {
        match err {
            CoreError::Validation(v) => v,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn full_lifecycle_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = tracker(&dir);

        t.start(Some("report".into()), at(9, 0)).unwrap();
        t.interrupt(InterruptionTag::Call, None, at(9, 30)).unwrap();
        t.return_from_interruption(at(10, 0)).unwrap();
        t.end(at(11, 0)).unwrap();

        let totals = t.totals(at(12, 0));
        assert_eq!(totals.work, Duration::minutes(90));
        assert_eq!(totals.interruptions, 1);

        let reopened = tracker(&dir);
        assert_eq!(reopened.day(), t.day());
    }

    #[test]
    fn second_start_is_rejected_without_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = tracker(&dir);
        t.start(None, at(9, 0)).unwrap();
        let before = t.day().clone();

        let err = t.start(None, at(9, 5)).unwrap_err();
        assert_eq!(validation(err), ValidationError::SessionAlreadyActive);
        assert_eq!(t.day(), &before);
    }

    #[test]
    fn lifecycle_violations() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = tracker(&dir);

        assert_eq!(
            validation(t.interrupt(InterruptionTag::Other, None, at(9, 0)).unwrap_err()),
            ValidationError::NoActiveSession
        );
        assert_eq!(
            validation(t.rename(Some("x".into())).unwrap_err()),
            ValidationError::NoActiveSession
        );

        t.start(None, at(9, 0)).unwrap();
        assert_eq!(
            validation(t.return_from_interruption(at(9, 1)).unwrap_err()),
            ValidationError::NotInterrupted
        );

        t.interrupt(InterruptionTag::Meeting, None, at(9, 10)).unwrap();
        assert_eq!(
            validation(t.interrupt(InterruptionTag::Call, None, at(9, 11)).unwrap_err()),
            ValidationError::AlreadyInterrupted
        );
        assert_eq!(
            validation(t.end(at(9, 12)).unwrap_err()),
            ValidationError::EndWhileInterrupted
        );
    }

    #[test]
    fn resume_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = tracker(&dir);
        t.start(None, at(9, 0)).unwrap();

        assert_eq!(
            validation(t.resume(0, at(9, 5)).unwrap_err()),
            ValidationError::SessionNotEnded(0)
        );

        t.end(at(10, 0)).unwrap();
        t.start(None, at(10, 30)).unwrap();
        assert_eq!(
            validation(t.resume(0, at(10, 45)).unwrap_err()),
            ValidationError::SessionAlreadyActive
        );

        t.end(at(11, 0)).unwrap();
        t.resume(0, at(11, 30)).unwrap();
        assert_eq!(t.day().active_index(), Some(0));
        assert_eq!(t.day().sessions[0].sub_sessions().len(), 2);

        assert!(matches!(
            validation(t.resume(7, at(12, 0)).unwrap_err()),
            ValidationError::OutOfBounds { index: 7, .. }
        ));
    }

    #[test]
    fn rename_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = tracker(&dir);
        t.start(Some("draft".into()), at(9, 0)).unwrap();
        t.rename(Some("final".into())).unwrap();
        assert_eq!(t.active_session().unwrap().description(), Some("final"));

        let removed = t.delete(0).unwrap();
        assert_eq!(removed.description(), Some("final"));
        assert!(t.active_session().is_none());
        assert!(t.delete(0).is_err());
    }

    #[test]
    fn active_session_is_carried_over_from_yesterday() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(StorageOptions::new(dir.path())).unwrap();
        let yesterday = date().pred_opt().unwrap();

        let mut previous = DailySessions::new(yesterday);
        let late = Local.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap();
        previous
            .sessions
            .push(Session::new(TimeEntry::new(EntryType::Start, late, None)));
        storage.save(&previous).unwrap();

        let t = Tracker::open_on(storage, date()).unwrap();
        let active = t.active_session().unwrap();
        assert!(active.continued_from_before(date()));
        assert!(t.storage().load(yesterday).unwrap().is_empty());
        assert_eq!(t.storage().load(date()).unwrap().sessions.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn failed_carry_over_keeps_session_in_yesterday() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(StorageOptions::new(dir.path())).unwrap();
        let yesterday = date().pred_opt().unwrap();

        let mut previous = DailySessions::new(yesterday);
        let late = Local.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap();
        previous
            .sessions
            .push(Session::new(TimeEntry::new(EntryType::Start, late, None)));
        storage.save(&previous).unwrap();

        // Today's file reads as missing but cannot be written.
        let missing = dir.path().join("missing").join("today.json");
        std::os::unix::fs::symlink(&missing, storage.file_path(date())).unwrap();

        let err = Tracker::open_on(storage, date()).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));

        let reopened = Storage::open(StorageOptions::new(dir.path())).unwrap();
        assert_eq!(reopened.load(yesterday).unwrap(), previous);
    }

    #[test]
    fn completed_session_from_yesterday_stays() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(StorageOptions::new(dir.path())).unwrap();
        let yesterday = date().pred_opt().unwrap();

        let start = Local.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap();
        let mut session = Session::new(TimeEntry::new(EntryType::Start, start, None));
        session
            .end(TimeEntry::new(EntryType::End, start + Duration::hours(1), None))
            .unwrap();
        let mut previous = DailySessions::new(yesterday);
        previous.sessions.push(session);
        storage.save(&previous).unwrap();

        let t = Tracker::open_on(storage, date()).unwrap();
        assert!(t.day().is_empty());
        assert_eq!(t.storage().load(yesterday).unwrap().sessions.len(), 1);
    }
}
