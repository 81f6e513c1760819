//! Aggregate queries over a range of days.
//!
//! Days that fail to load are skipped with a warning.

use chrono::{DateTime, Local};

use super::range::DateRange;
use super::store::Storage;
use crate::accounting::{daily_totals, Totals};
use crate::error::Result;
use crate::stats::{DetailedStats, InterruptionTagStats, TagStatsCollector};
use crate::tracking::DailySessions;

impl Storage {
    /// Every readable day in `range`, oldest first.
    pub fn days_in(&self, range: DateRange) -> impl Iterator<Item = DailySessions> + '_ {
        range.days().filter_map(move |date| match self.load(date) {
            Ok(day) => Some(day),
            Err(e) => {
                tracing::warn!(%date, error = %e, "skipping unreadable day");
                None
            }
        })
    }

    /// Work/interruption totals for a range keyword.
    pub fn totals(&self, keyword: &str) -> Result<Totals> {
        let range = self.date_range(keyword)?;
        Ok(self.totals_in(range, Local::now()))
    }

    pub fn totals_in(&self, range: DateRange, now: DateTime<Local>) -> Totals {
        self.days_in(range).map(|day| daily_totals(&day, now)).sum()
    }

    /// Per-tag interruption statistics for a range keyword.
    pub fn tag_stats(&self, keyword: &str) -> Result<Vec<InterruptionTagStats>> {
        let range = self.date_range(keyword)?;
        Ok(self.tag_stats_in(range))
    }

    pub fn tag_stats_in(&self, range: DateRange) -> Vec<InterruptionTagStats> {
        let mut collector = TagStatsCollector::new(self.custom_tags(), self.recovery());
        for day in self.days_in(range) {
            collector.add_day(&day);
        }
        collector.finish()
    }

    /// Productivity analytics for a range keyword.
    pub fn detailed_stats(&self, keyword: &str) -> Result<DetailedStats> {
        let range = self.date_range(keyword)?;
        Ok(self.detailed_stats_in(range, Local::now()))
    }

    pub fn detailed_stats_in(&self, range: DateRange, now: DateTime<Local>) -> DetailedStats {
        let mut stats = DetailedStats::new(range.start, range.end);
        for day in self.days_in(range) {
            stats.add_day(&day, now);
        }
        stats.finish(self.recovery())
    }
}
