//! Per-tag interruption statistics.
//!
//! Completed interruption/return pairs are attributed to the tag of the
//! interruption entry (unset tags count as `other`). Every known tag is
//! reported, including tags with no interruptions.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accounting::RecoveryPolicy;
use crate::duration;
use crate::tracking::{DailySessions, InterruptionTag};

/// Statistics for one interruption tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptionTagStats {
    pub tag: InterruptionTag,
    pub count: usize,
    /// Pure interruption time, without recovery
    #[serde(with = "crate::duration::seconds", rename = "total_seconds")]
    pub total_time: Duration,
    #[serde(with = "crate::duration::seconds", rename = "recovery_seconds")]
    pub recovery_time: Duration,
    #[serde(with = "crate::duration::seconds", rename = "total_with_recovery_seconds")]
    pub total_with_recovery: Duration,
    /// Average pure interruption time
    #[serde(with = "crate::duration::seconds", rename = "average_seconds")]
    pub average_time: Duration,
}

impl InterruptionTagStats {
    pub fn empty(tag: InterruptionTag) -> Self {
        Self {
            tag,
            count: 0,
            total_time: Duration::zero(),
            recovery_time: Duration::zero(),
            total_with_recovery: Duration::zero(),
            average_time: Duration::zero(),
        }
    }

    /// Stats for `count` interruptions totalling `total_time`.
    pub fn from_totals(
        tag: InterruptionTag,
        count: usize,
        total_time: Duration,
        policy: RecoveryPolicy,
    ) -> Self {
        let recovery_time = policy.for_count(count);
        let mut stats = Self {
            tag,
            count,
            total_time,
            recovery_time,
            total_with_recovery: total_time + recovery_time,
            average_time: Duration::zero(),
        };
        stats.update_average();
        stats
    }

    fn record(&mut self, span: Duration, policy: RecoveryPolicy) {
        self.count += 1;
        self.total_time = self.total_time + span;
        self.recovery_time = self.recovery_time + policy.per_interruption();
        self.total_with_recovery = self.total_time + self.recovery_time;
    }

    fn update_average(&mut self) {
        self.average_time = duration::average(self.total_time, self.count);
    }
}

/// Accumulates tag statistics over one or more days.
#[derive(Debug, Clone)]
pub struct TagStatsCollector {
    policy: RecoveryPolicy,
    stats: BTreeMap<InterruptionTag, InterruptionTagStats>,
}

impl TagStatsCollector {
    /// Start with a zero entry for every built-in tag and every configured
    /// custom label.
    pub fn new(custom_tags: &[String], policy: RecoveryPolicy) -> Self {
        let stats = InterruptionTag::known(custom_tags)
            .into_iter()
            .map(|tag| (tag.clone(), InterruptionTagStats::empty(tag)))
            .collect();
        Self { policy, stats }
    }

    pub fn add_day(&mut self, day: &DailySessions) {
        for session in &day.sessions {
            for (interrupted, returned) in session.interruption_pairs() {
                let tag = interrupted.effective_tag();
                let span = returned.timestamp - interrupted.timestamp;
                self.stats
                    .entry(tag.clone())
                    .or_insert_with(|| InterruptionTagStats::empty(tag))
                    .record(span, self.policy);
            }
        }
    }

    /// Stats sorted by tag, with averages filled in.
    pub fn finish(self) -> Vec<InterruptionTagStats> {
        self.stats
            .into_values()
            .map(|mut stats| {
                stats.update_average();
                stats
            })
            .collect()
    }
}

/// Tag statistics for a single day.
pub fn interruption_tag_stats(
    day: &DailySessions,
    custom_tags: &[String],
    policy: RecoveryPolicy,
) -> Vec<InterruptionTagStats> {
    let mut collector = TagStatsCollector::new(custom_tags, policy);
    collector.add_day(day);
    collector.finish()
}
