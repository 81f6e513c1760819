//! Work and interruption accounting.
//!
//! Pure functions over sessions: each sub-session contributes its span
//! (ending at `now` while still active) minus the spans of its completed
//! interruption/return pairs. A trailing unmatched interruption contributes
//! nothing.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::tracking::{DailySessions, Session, SubSession};

/// Minutes of context-switch cost charged after every completed interruption.
pub const DEFAULT_RECOVERY_MINUTES: i64 = 10;

/// Recovery time charged per completed interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    per_interruption: Duration,
}

impl RecoveryPolicy {
    /// Negative minutes count as zero; values beyond the range of
    /// [`Duration`] saturate.
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            per_interruption: Duration::try_minutes(minutes.max(0)).unwrap_or(Duration::MAX),
        }
    }

    pub fn per_interruption(&self) -> Duration {
        self.per_interruption
    }

    /// Recovery time for `count` interruptions.
    pub fn for_count(&self, count: usize) -> Duration {
        crate::duration::saturating_mul(self.per_interruption, count)
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_RECOVERY_MINUTES)
    }
}

/// Work time, interruption time and completed interruption count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(with = "crate::duration::seconds", rename = "work_seconds")]
    pub work: Duration,
    #[serde(with = "crate::duration::seconds", rename = "interruption_seconds")]
    pub interruption: Duration,
    pub interruptions: usize,
}

impl Totals {
    pub fn zero() -> Self {
        Self {
            work: Duration::zero(),
            interruption: Duration::zero(),
            interruptions: 0,
        }
    }

    pub fn recovery(&self, policy: RecoveryPolicy) -> Duration {
        policy.for_count(self.interruptions)
    }

    /// Interruption time plus recovery time.
    pub fn impact(&self, policy: RecoveryPolicy) -> Duration {
        self.interruption + self.recovery(policy)
    }
}

impl Default for Totals {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, rhs: Totals) -> Totals {
        Totals {
            work: self.work + rhs.work,
            interruption: self.interruption + rhs.interruption,
            interruptions: self.interruptions + rhs.interruptions,
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Totals) {
        *self = *self + rhs;
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Totals {
        iter.fold(Totals::zero(), Add::add)
    }
}

pub fn sub_session_totals(sub: &SubSession, now: DateTime<Local>) -> Totals {
    let end = sub.end.as_ref().map_or(now, |e| e.timestamp);
    let span = (end - sub.start.timestamp).max(Duration::zero());

    let mut interruption = Duration::zero();
    let mut interruptions = 0;
    for (interrupted, returned) in sub.completed_pairs() {
        interruption = interruption + (returned.timestamp - interrupted.timestamp);
        interruptions += 1;
    }

    Totals {
        work: span - interruption,
        interruption,
        interruptions,
    }
}

pub fn session_totals(session: &Session, now: DateTime<Local>) -> Totals {
    session
        .sub_sessions()
        .iter()
        .map(|sub| sub_session_totals(sub, now))
        .sum()
}

pub fn daily_totals(day: &DailySessions, now: DateTime<Local>) -> Totals {
    day.sessions.iter().map(|s| session_totals(s, now)).sum()
}
