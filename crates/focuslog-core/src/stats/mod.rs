//! Statistics module for focuslog
//!
//! This module provides interruption statistics per tag and range-level
//! productivity analytics (score, most productive hour, trend).

mod detailed;
mod tags;

pub use detailed::DetailedStats;
pub use tags::{interruption_tag_stats, InterruptionTagStats, TagStatsCollector};
