//! Day-scoped collection of sessions.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::null_as_default;
use super::session::Session;
use crate::error::ValidationError;

/// All sessions recorded for one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySessions {
    #[serde(serialize_with = "serialize_day", deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<Session>,
}

impl DailySessions {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sessions: Vec::new(),
        }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Index of the session that has not ended yet, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.sessions.iter().position(Session::is_active)
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_index().map(|i| &self.sessions[i])
    }

    pub fn active_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.is_active())
    }

    pub fn session(&self, index: usize) -> Result<&Session, ValidationError> {
        let len = self.sessions.len();
        self.sessions
            .get(index)
            .ok_or_else(|| out_of_bounds(index, len))
    }

    pub fn session_mut(&mut self, index: usize) -> Result<&mut Session, ValidationError> {
        let len = self.sessions.len();
        self.sessions
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(index, len))
    }

    /// Remove the session at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Session, ValidationError> {
        if index >= self.sessions.len() {
            return Err(out_of_bounds(index, self.sessions.len()));
        }
        Ok(self.sessions.remove(index))
    }

    /// Replace the sessions at `a` and `b` with their merge, appended last.
    ///
    /// Both sessions must be completed. Indices are validated before
    /// anything is removed.
    pub fn merge(&mut self, a: usize, b: usize) -> Result<&Session, ValidationError> {
        let len = self.sessions.len();
        for index in [a, b] {
            if index >= len {
                return Err(out_of_bounds(index, len));
            }
        }
        if a == b {
            return Err(ValidationError::SameSession(a));
        }
        for index in [a, b] {
            if self.sessions[index].is_active() {
                return Err(ValidationError::MergeActive(index));
            }
        }

        // Remove the higher index first so the lower one stays valid.
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let second = self.sessions.remove(high);
        let first = self.sessions.remove(low);

        self.sessions.push(Session::merge(first, second));
        let last = self.sessions.len() - 1;
        Ok(&self.sessions[last])
    }

    /// Sessions ordered for display: active first, then newest start first.
    pub fn display_order(&self) -> Vec<(usize, &Session)> {
        let mut ordered: Vec<(usize, &Session)> = self.sessions.iter().enumerate().collect();
        ordered.sort_by(|(_, a), (_, b)| {
            b.is_active()
                .cmp(&a.is_active())
                .then_with(|| b.start.timestamp.cmp(&a.start.timestamp))
        });
        ordered
    }
}

fn out_of_bounds(index: usize, len: usize) -> ValidationError {
    ValidationError::OutOfBounds {
        collection: "sessions".to_string(),
        index,
        len,
    }
}

fn serialize_day<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.date_naive())
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}")))
}
