//! Sessions and sub-sessions.
//!
//! A [`Session`] owns an ordered list of [`SubSession`]s, one per continuous
//! work period. The flat interruption list older files carry next to
//! `sub_sessions` is not stored in memory; it is derived from the
//! sub-sessions when needed and regenerated on every write.

use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use super::entry::{EntryType, InterruptionTag, TimeEntry};
use super::null_as_default;
use crate::error::ValidationError;

const MERGE_GAP_DESCRIPTION: &str = "Auto-created gap between merged sessions";

/// One continuous work period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubSession {
    pub start: TimeEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<TimeEntry>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub interruptions: Vec<TimeEntry>,
}

impl SubSession {
    pub fn new(start: TimeEntry) -> Self {
        Self {
            start,
            end: None,
            interruptions: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// An odd number of interruption entries means the last one has no return yet.
    pub fn is_interrupted(&self) -> bool {
        self.interruptions.len() % 2 == 1
    }

    /// Completed (interruption, return) pairs. A trailing unmatched
    /// interruption is not yielded.
    pub fn completed_pairs(&self) -> impl Iterator<Item = (&TimeEntry, &TimeEntry)> {
        self.interruptions.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// On-disk shape of a session, including the legacy flat interruption list.
#[derive(Deserialize)]
struct SessionRecord {
    #[serde(default)]
    id: String,
    start: TimeEntry,
    #[serde(default)]
    end: Option<TimeEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    sub_sessions: Vec<SubSession>,
    #[serde(default, deserialize_with = "null_as_default")]
    interruptions: Vec<TimeEntry>,
}

#[derive(Serialize)]
struct SessionRecordRef<'a> {
    id: &'a str,
    start: &'a TimeEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<&'a TimeEntry>,
    sub_sessions: &'a [SubSession],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    interruptions: Vec<&'a TimeEntry>,
}

/// A work session made of one or more sub-sessions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SessionRecord")]
pub struct Session {
    pub id: String,
    pub start: TimeEntry,
    pub end: Option<TimeEntry>,
    sub_sessions: Vec<SubSession>,
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        // Sessions written before sub-sessions existed carry their
        // interruptions directly; they become a single sub-session.
        let sub_sessions = if record.sub_sessions.is_empty() {
            vec![SubSession {
                start: record.start.clone(),
                end: record.end.clone(),
                interruptions: record.interruptions,
            }]
        } else {
            record.sub_sessions
        };

        Self {
            id: record.id,
            start: record.start,
            end: record.end,
            sub_sessions,
        }
    }
}

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SessionRecordRef {
            id: &self.id,
            start: &self.start,
            end: self.end.as_ref(),
            sub_sessions: &self.sub_sessions,
            interruptions: self.interruptions().collect(),
        }
        .serialize(serializer)
    }
}

impl Session {
    /// Start a new session with its first sub-session.
    pub fn new(start: TimeEntry) -> Self {
        Self {
            id: new_session_id(),
            sub_sessions: vec![SubSession::new(start.clone())],
            start,
            end: None,
        }
    }

    /// Build a session from already-assembled parts.
    ///
    /// An empty `sub_sessions` list is replaced by a single sub-session
    /// spanning `start..end`.
    pub fn from_parts(
        id: impl Into<String>,
        start: TimeEntry,
        end: Option<TimeEntry>,
        sub_sessions: Vec<SubSession>,
    ) -> Self {
        Session::from(SessionRecord {
            id: id.into(),
            start,
            end,
            sub_sessions,
            interruptions: Vec::new(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    pub fn description(&self) -> Option<&str> {
        self.start.description.as_deref()
    }

    pub fn sub_sessions(&self) -> &[SubSession] {
        &self.sub_sessions
    }

    pub fn current_sub_session(&self) -> Option<&SubSession> {
        self.sub_sessions.last()
    }

    pub fn is_interrupted(&self) -> bool {
        self.is_active()
            && self
                .current_sub_session()
                .is_some_and(SubSession::is_interrupted)
    }

    /// Flat view of every interruption/return entry across sub-sessions.
    pub fn interruptions(&self) -> impl Iterator<Item = &TimeEntry> {
        self.sub_sessions.iter().flat_map(|s| s.interruptions.iter())
    }

    /// Completed (interruption, return) pairs of the flat view.
    pub fn interruption_pairs(&self) -> Vec<(&TimeEntry, &TimeEntry)> {
        let flat: Vec<&TimeEntry> = self.interruptions().collect();
        flat.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
    }

    /// Number of completed interruptions across all sub-sessions.
    pub fn interruption_count(&self) -> usize {
        self.sub_sessions
            .iter()
            .map(|s| s.interruptions.len() / 2)
            .sum()
    }

    /// True while an active session is inside the recovery window that
    /// follows its most recent return.
    pub fn in_recovery(&self, now: DateTime<Local>, recovery: Duration) -> bool {
        if !self.is_active() || self.is_interrupted() {
            return false;
        }
        match self.interruptions().last() {
            Some(last) if last.kind == EntryType::Return => now < last.timestamp + recovery,
            _ => false,
        }
    }

    /// True when the session started on a day before `day`.
    pub fn continued_from_before(&self, day: NaiveDate) -> bool {
        self.start.timestamp.date_naive() < day
    }

    /// Record an interruption in the current sub-session.
    pub fn interrupt(&mut self, entry: TimeEntry) -> Result<(), ValidationError> {
        if !self.is_active() {
            return Err(ValidationError::NoActiveSession);
        }
        if self.is_interrupted() {
            return Err(ValidationError::AlreadyInterrupted);
        }
        let current = self
            .sub_sessions
            .last_mut()
            .ok_or(ValidationError::NoActiveSession)?;
        current.interruptions.push(entry);
        Ok(())
    }

    /// Record the return from the pending interruption.
    pub fn return_from_interruption(&mut self, entry: TimeEntry) -> Result<(), ValidationError> {
        if !self.is_active() {
            return Err(ValidationError::NoActiveSession);
        }
        if !self.is_interrupted() {
            return Err(ValidationError::NotInterrupted);
        }
        let current = self
            .sub_sessions
            .last_mut()
            .ok_or(ValidationError::NoActiveSession)?;
        current.interruptions.push(entry);
        Ok(())
    }

    /// End the session and its current sub-session.
    pub fn end(&mut self, entry: TimeEntry) -> Result<(), ValidationError> {
        if !self.is_active() {
            return Err(ValidationError::NoActiveSession);
        }
        if self.is_interrupted() {
            return Err(ValidationError::EndWhileInterrupted);
        }
        if let Some(current) = self.sub_sessions.last_mut() {
            current.end = Some(entry.clone());
        }
        self.end = Some(entry);
        Ok(())
    }

    /// Reopen a completed session with a new sub-session.
    pub fn resume(&mut self, start: TimeEntry) -> Result<(), ValidationError> {
        if self.is_active() {
            return Err(ValidationError::SessionAlreadyActive);
        }
        self.sub_sessions.push(SubSession::new(start));
        self.end = None;
        Ok(())
    }

    pub fn rename(&mut self, description: Option<String>) {
        self.start.description = description.filter(|d| !d.trim().is_empty());
    }

    /// Merge two sessions into a new one.
    ///
    /// The sessions are ordered by start time and their sub-sessions
    /// concatenated. When the earlier session ended strictly before the later
    /// one started, the two touching sub-sessions are joined and the gap is
    /// recorded as one interruption/return pair tagged `other`.
    ///
    /// Both sessions must be completed; `DailySessions::merge` checks this.
    pub(crate) fn merge(first: Session, second: Session) -> Session {
        let (earlier, later) = if first.start.timestamp <= second.start.timestamp {
            (first, second)
        } else {
            (second, first)
        };

        let gap = earlier
            .end
            .as_ref()
            .map(|end| end.timestamp)
            .filter(|ended| *ended < later.start.timestamp)
            .map(|ended| (ended, later.start.timestamp));

        let mut sub_sessions = earlier.sub_sessions;
        let mut rest = later.sub_sessions.into_iter();

        if let Some((gap_start, gap_end)) = gap {
            if let Some(last) = sub_sessions.last_mut() {
                if let Some(next) = rest.next() {
                    last.interruptions.push(TimeEntry::interruption(
                        gap_start,
                        InterruptionTag::Other,
                        Some(MERGE_GAP_DESCRIPTION.to_string()),
                    ));
                    last.interruptions
                        .push(TimeEntry::new(EntryType::Return, gap_end, None));
                    last.interruptions.extend(next.interruptions);
                    last.end = next.end;
                }
            }
        }
        sub_sessions.extend(rest);

        Session {
            id: new_session_id(),
            start: earlier.start,
            end: later.end,
            sub_sessions,
        }
    }

    /// Assign an id when the session has none. Returns whether it changed.
    pub(crate) fn ensure_id(&mut self) -> bool {
        if self.id.trim().is_empty() {
            self.id = new_session_id();
            true
        } else {
            false
        }
    }
}

fn new_session_id() -> String {
    format!("sess_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn started(hour: u32, minute: u32) -> Session {
        Session::new(TimeEntry::new(EntryType::Start, at(hour, minute), Some("work".into())))
    }

    #[test]
    fn new_session_has_one_active_sub_session() {
        let session = started(9, 0);
        assert!(session.is_active());
        assert_eq!(session.sub_sessions().len(), 1);
        assert!(session.id.starts_with("sess_"));
    }

    #[test]
    fn interrupt_twice_is_rejected() {
        let mut session = started(9, 0);
        session
            .interrupt(TimeEntry::interruption(at(9, 10), InterruptionTag::Call, None))
            .unwrap();
        let err = session
            .interrupt(TimeEntry::interruption(at(9, 15), InterruptionTag::Call, None))
            .unwrap_err();
        assert_eq!(err, ValidationError::AlreadyInterrupted);
        assert_eq!(session.interruptions().count(), 1);
    }

    #[test]
    fn return_without_interruption_is_rejected() {
        let mut session = started(9, 0);
        let err = session
            .return_from_interruption(TimeEntry::new(EntryType::Return, at(9, 5), None))
            .unwrap_err();
        assert_eq!(err, ValidationError::NotInterrupted);
    }

    #[test]
    fn end_while_interrupted_is_rejected() {
        let mut session = started(9, 0);
        session
            .interrupt(TimeEntry::interruption(at(9, 10), InterruptionTag::Meeting, None))
            .unwrap();
        let err = session
            .end(TimeEntry::new(EntryType::End, at(10, 0), None))
            .unwrap_err();
        assert_eq!(err, ValidationError::EndWhileInterrupted);
        assert!(session.is_active());
    }

    #[test]
    fn end_closes_current_sub_session() {
        let mut session = started(9, 0);
        session
            .end(TimeEntry::new(EntryType::End, at(10, 0), None))
            .unwrap();
        assert!(!session.is_active());
        assert!(session.sub_sessions()[0].end.is_some());
    }

    #[test]
    fn resume_appends_sub_session() {
        let mut session = started(9, 0);
        session
            .end(TimeEntry::new(EntryType::End, at(10, 0), None))
            .unwrap();
        session
            .resume(TimeEntry::new(EntryType::Start, at(11, 0), None))
            .unwrap();
        assert!(session.is_active());
        assert_eq!(session.sub_sessions().len(), 2);
        assert_eq!(
            session.resume(TimeEntry::new(EntryType::Start, at(12, 0), None)),
            Err(ValidationError::SessionAlreadyActive)
        );
    }

    #[test]
    fn recovery_window_follows_last_return() {
        let mut session = started(9, 0);
        session
            .interrupt(TimeEntry::interruption(at(9, 10), InterruptionTag::Call, None))
            .unwrap();
        session
            .return_from_interruption(TimeEntry::new(EntryType::Return, at(9, 20), None))
            .unwrap();
        assert!(session.in_recovery(at(9, 25), Duration::minutes(10)));
        assert!(!session.in_recovery(at(9, 31), Duration::minutes(10)));
    }

    #[test]
    fn merge_with_gap_adds_one_synthetic_pair() {
        let mut first = started(9, 0);
        first.end(TimeEntry::new(EntryType::End, at(10, 0), None)).unwrap();
        let mut second = started(10, 30);
        second.end(TimeEntry::new(EntryType::End, at(11, 0), None)).unwrap();

        let merged = Session::merge(second, first);
        let flat: Vec<&TimeEntry> = merged.interruptions().collect();

        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].kind, EntryType::Interruption);
        assert_eq!(flat[0].timestamp, at(10, 0));
        assert_eq!(flat[0].tag, Some(InterruptionTag::Other));
        assert_eq!(flat[1].kind, EntryType::Return);
        assert_eq!(flat[1].timestamp, at(10, 30));
        assert_eq!(merged.start.timestamp, at(9, 0));
        assert_eq!(merged.end.as_ref().map(|e| e.timestamp), Some(at(11, 0)));
        assert_eq!(merged.sub_sessions().len(), 1);
    }

    #[test]
    fn merge_of_overlapping_sessions_adds_no_pair() {
        let mut first = started(9, 0);
        first.end(TimeEntry::new(EntryType::End, at(10, 0), None)).unwrap();
        let mut second = started(9, 30);
        second.end(TimeEntry::new(EntryType::End, at(11, 0), None)).unwrap();

        let merged = Session::merge(first, second);
        assert_eq!(merged.interruptions().count(), 0);
        assert_eq!(merged.sub_sessions().len(), 2);
    }

    #[test]
    fn legacy_shape_becomes_single_sub_session() {
        let json = r#"{
            "id": "old",
            "start": {"id":"1","type":"START","start_time":"2025-03-10T09:00:00+00:00"},
            "end": {"id":"2","type":"END","start_time":"2025-03-10T10:00:00+00:00"},
            "sub_sessions": null,
            "interruptions": [
                {"id":"3","type":"INTERRUPTION","start_time":"2025-03-10T09:10:00+00:00","tag":"call"},
                {"id":"4","type":"RETURN","start_time":"2025-03-10T09:20:00+00:00"}
            ]
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.sub_sessions().len(), 1);
        assert_eq!(session.sub_sessions()[0].interruptions.len(), 2);
        assert!(session.sub_sessions()[0].end.is_some());
    }

    #[test]
    fn serialized_session_mirrors_flat_interruptions() {
        let mut session = started(9, 0);
        session
            .interrupt(TimeEntry::interruption(at(9, 10), InterruptionTag::Call, None))
            .unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["interruptions"].as_array().unwrap().len(), 1);
        assert_eq!(json["sub_sessions"][0]["interruptions"].as_array().unwrap().len(), 1);
        assert!(json.get("end").is_none());
    }
}
