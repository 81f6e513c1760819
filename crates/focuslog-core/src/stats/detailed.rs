//! Range-level statistics and productivity analytics.

use chrono::{DateTime, Duration, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accounting::{daily_totals, session_totals, RecoveryPolicy};
use crate::duration;
use crate::stats::InterruptionTagStats;
use crate::tracking::{DailySessions, InterruptionTag};

/// Ratio of interruptions to sessions above which the score is penalised.
const INTERRUPTION_RATIO_THRESHOLD: f64 = 0.5;
/// Score penalty per unit of interruption ratio above the threshold.
const INTERRUPTION_PENALTY_FACTOR: f64 = 0.2;

/// Statistics over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(with = "crate::duration::seconds", rename = "total_work_seconds")]
    pub total_work: Duration,
    pub total_sessions: usize,
    #[serde(with = "crate::duration::seconds", rename = "longest_session_seconds")]
    pub longest_session: Duration,
    #[serde(with = "crate::duration::seconds", rename = "average_session_seconds")]
    pub average_session: Duration,

    pub total_interruptions: usize,
    pub interruptions_by_tag: BTreeMap<InterruptionTag, usize>,
    #[serde(with = "crate::duration::seconds_map", rename = "interruption_seconds_by_tag")]
    pub interruption_duration_by_tag: BTreeMap<InterruptionTag, Duration>,

    /// Work time per date
    #[serde(with = "crate::duration::seconds_map", rename = "daily_work_seconds")]
    pub daily_work: BTreeMap<NaiveDate, Duration>,
    /// Work time per start hour (0-23, local time)
    #[serde(with = "crate::duration::seconds_map", rename = "hourly_work_seconds")]
    pub hourly_work: BTreeMap<u32, Duration>,

    /// 0-100, see [`DetailedStats::productivity_score`]
    pub productivity_score: f64,
}

impl DetailedStats {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            total_work: Duration::zero(),
            total_sessions: 0,
            longest_session: Duration::zero(),
            average_session: Duration::zero(),
            total_interruptions: 0,
            interruptions_by_tag: BTreeMap::new(),
            interruption_duration_by_tag: BTreeMap::new(),
            daily_work: BTreeMap::new(),
            hourly_work: BTreeMap::new(),
            productivity_score: 0.0,
        }
    }

    /// Fold one day into the statistics.
    ///
    /// The day's work total (active sessions included, measured to `now`)
    /// goes into the per-date map. Session counts, per-hour buckets and the
    /// per-tag breakdown only consider completed sessions.
    pub fn add_day(&mut self, day: &DailySessions, now: DateTime<Local>) {
        let day_work = daily_totals(day, now).work;
        let slot = self.daily_work.entry(day.date).or_insert_with(Duration::zero);
        *slot = *slot + day_work;
        self.total_work = self.total_work + day_work;

        for session in day.sessions.iter().filter(|s| !s.is_active()) {
            let pure_work = session_totals(session, now).work;

            self.total_sessions += 1;
            self.longest_session = self.longest_session.max(pure_work);
            // The average is kept as a running sum until `finish`.
            self.average_session = self.average_session + pure_work;

            let hour = session.start.timestamp.hour();
            let slot = self.hourly_work.entry(hour).or_insert_with(Duration::zero);
            *slot = *slot + pure_work;

            for (interrupted, returned) in session.interruption_pairs() {
                let tag = interrupted.effective_tag();
                let span = returned.timestamp - interrupted.timestamp;
                *self.interruptions_by_tag.entry(tag.clone()).or_insert(0) += 1;
                let slot = self
                    .interruption_duration_by_tag
                    .entry(tag)
                    .or_insert_with(Duration::zero);
                *slot = *slot + span;
                self.total_interruptions += 1;
            }
        }
    }

    /// Turn the running session sum into an average and compute the score.
    pub fn finish(mut self, policy: RecoveryPolicy) -> Self {
        self.average_session = duration::average(self.average_session, self.total_sessions);
        self.productivity_score = self.productivity_score(policy);
        self
    }

    /// Focus score in `[0, 100]`.
    ///
    /// `work / (work + interruption + recovery) * 100`, reduced by
    /// `(ratio - 0.5) * 0.2` when there are more than 0.5 interruptions per
    /// session. No work means a score of 0.
    pub fn productivity_score(&self, policy: RecoveryPolicy) -> f64 {
        if self.total_work <= Duration::zero() {
            return 0.0;
        }

        let interruption_time = self
            .interruption_duration_by_tag
            .values()
            .fold(Duration::zero(), |acc, d| acc + *d);
        let recovery_time = policy.for_count(self.total_interruptions);

        let work = seconds_f64(self.total_work);
        let total = work + seconds_f64(interruption_time) + seconds_f64(recovery_time);
        let mut score = work / total * 100.0;

        let ratio = if self.total_sessions > 0 {
            self.total_interruptions as f64 / self.total_sessions as f64
        } else {
            0.0
        };
        if ratio > INTERRUPTION_RATIO_THRESHOLD {
            score *= 1.0 - (ratio - INTERRUPTION_RATIO_THRESHOLD) * INTERRUPTION_PENALTY_FACTOR;
        }

        score.clamp(0.0, 100.0)
    }

    /// Hour with the most work; ties go to the earliest hour.
    pub fn most_productive_hour(&self) -> Option<(u32, Duration)> {
        let mut best: Option<(u32, Duration)> = None;
        for (&hour, &work) in &self.hourly_work {
            if work <= Duration::zero() {
                continue;
            }
            match best {
                Some((_, max)) if work <= max => {}
                _ => best = Some((hour, work)),
            }
        }
        best
    }

    /// Per-tag breakdown, sorted by tag.
    pub fn interruption_breakdown(&self, policy: RecoveryPolicy) -> Vec<InterruptionTagStats> {
        self.interruptions_by_tag
            .iter()
            .map(|(tag, &count)| {
                let total = self
                    .interruption_duration_by_tag
                    .get(tag)
                    .copied()
                    .unwrap_or_else(Duration::zero);
                InterruptionTagStats::from_totals(tag.clone(), count, total, policy)
            })
            .collect()
    }

    /// Slope of hours worked per day over days since `start_date`.
    ///
    /// Positive means improving. Needs at least two dates, otherwise 0.
    pub fn productivity_trend(&self) -> f64 {
        if self.daily_work.len() < 2 {
            return 0.0;
        }

        let n = self.daily_work.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
        for (date, work) in &self.daily_work {
            let x = (*date - self.start_date).num_days() as f64;
            let y = seconds_f64(*work) / 3600.0;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_x2 += x * x;
        }

        let denominator = n * sum_x2 - sum_x * sum_x;
        if denominator == 0.0 {
            return 0.0;
        }
        (n * sum_xy - sum_x * sum_y) / denominator
    }
}

fn seconds_f64(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{EntryType, Session, TimeEntry};
    use chrono::TimeZone;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    fn finished(day: u32, start_hour: u32, minutes: i64, pairs: &[(InterruptionTag, i64, i64)]) -> Session {
        let start = at(day, start_hour, 0);
        let mut s = Session::new(TimeEntry::new(EntryType::Start, start, None));
        for (tag, from, to) in pairs {
            s.interrupt(TimeEntry::interruption(start + Duration::minutes(*from), tag.clone(), None))
                .unwrap();
            s.return_from_interruption(TimeEntry::new(
                EntryType::Return,
                start + Duration::minutes(*to),
                None,
            ))
            .unwrap();
        }
        s.end(TimeEntry::new(EntryType::End, start + Duration::minutes(minutes), None))
            .unwrap();
        s
    }

    fn day(d: u32, sessions: Vec<Session>) -> DailySessions {
        let mut day = DailySessions::new(date(d));
        day.sessions = sessions;
        day
    }

    #[test]
    fn zero_work_scores_zero() {
        let stats = DetailedStats::new(date(1), date(1));
        assert_eq!(stats.productivity_score(RecoveryPolicy::default()), 0.0);
    }

    #[test]
    fn uninterrupted_work_scores_hundred() {
        let mut stats = DetailedStats::new(date(10), date(10));
        stats.add_day(&day(10, vec![finished(10, 9, 60, &[])]), at(10, 23, 0));
        let stats = stats.finish(RecoveryPolicy::default());
        assert!((stats.productivity_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn score_applies_recovery_and_penalty() {
        // 2h span, one 30m call: work 90m, impact 30m + 10m recovery.
        // One interruption per session => ratio 1.0, penalty 0.9.
        let mut stats = DetailedStats::new(date(10), date(10));
        stats.add_day(
            &day(10, vec![finished(10, 9, 120, &[(InterruptionTag::Call, 30, 60)])]),
            at(10, 23, 0),
        );
        let stats = stats.finish(RecoveryPolicy::default());
        let expected = 90.0 / 130.0 * 100.0 * 0.9;
        assert!((stats.productivity_score - expected).abs() < 1e-9);
        assert_eq!(stats.total_interruptions, 1);
        assert_eq!(stats.interruptions_by_tag[&InterruptionTag::Call], 1);
    }

    #[test]
    fn session_metrics_and_hourly_buckets() {
        let mut stats = DetailedStats::new(date(10), date(10));
        stats.add_day(
            &day(10, vec![finished(10, 9, 60, &[]), finished(10, 14, 30, &[])]),
            at(10, 23, 0),
        );
        let stats = stats.finish(RecoveryPolicy::default());
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.longest_session, Duration::minutes(60));
        assert_eq!(stats.average_session, Duration::minutes(45));
        assert_eq!(stats.hourly_work.keys().copied().collect::<Vec<_>>(), vec![9, 14]);
        assert_eq!(stats.most_productive_hour(), Some((9, Duration::minutes(60))));
    }

    #[test]
    fn most_productive_hour_tie_goes_to_earliest() {
        let mut stats = DetailedStats::new(date(10), date(10));
        stats.hourly_work.insert(15, Duration::minutes(30));
        stats.hourly_work.insert(8, Duration::minutes(30));
        stats.hourly_work.insert(11, Duration::minutes(10));
        assert_eq!(stats.most_productive_hour(), Some((8, Duration::minutes(30))));
        assert_eq!(DetailedStats::new(date(1), date(1)).most_productive_hour(), None);
    }

    #[test]
    fn active_sessions_count_for_the_day_only() {
        let active = Session::new(TimeEntry::new(EntryType::Start, at(10, 9, 0), None));
        let mut stats = DetailedStats::new(date(10), date(10));
        stats.add_day(&day(10, vec![active]), at(10, 10, 0));
        assert_eq!(stats.daily_work[&date(10)], Duration::hours(1));
        assert_eq!(stats.total_sessions, 0);
    }

    #[test]
    fn trend_needs_two_days() {
        let mut stats = DetailedStats::new(date(1), date(3));
        stats.daily_work.insert(date(1), Duration::hours(2));
        assert_eq!(stats.productivity_trend(), 0.0);

        stats.daily_work.insert(date(2), Duration::hours(3));
        stats.daily_work.insert(date(3), Duration::hours(4));
        assert!((stats.productivity_trend() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn declining_trend_is_negative() {
        let mut stats = DetailedStats::new(date(1), date(5));
        stats.daily_work.insert(date(1), Duration::hours(6));
        stats.daily_work.insert(date(5), Duration::hours(2));
        assert!((stats.productivity_trend() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn breakdown_is_sorted_by_tag() {
        let mut stats = DetailedStats::new(date(10), date(10));
        stats.add_day(
            &day(
                10,
                vec![finished(
                    10,
                    9,
                    180,
                    &[(InterruptionTag::Other, 10, 20), (InterruptionTag::Call, 30, 60)],
                )],
            ),
            at(10, 23, 0),
        );
        let breakdown = stats.interruption_breakdown(RecoveryPolicy::default());
        assert_eq!(breakdown[0].tag, InterruptionTag::Call);
        assert_eq!(breakdown[0].total_with_recovery, Duration::minutes(40));
        assert_eq!(breakdown[1].tag, InterruptionTag::Other);
    }
}
