//! Date ranges selected by keyword.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::store::Storage;
use crate::error::ValidationError;

/// Range keyword: `day`, `week`, `month`, `quarter`, `year` or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Day,
    Week,
    Month,
    Quarter,
    Year,
    All,
}

impl RangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKind::Day => "day",
            RangeKind::Week => "week",
            RangeKind::Month => "month",
            RangeKind::Quarter => "quarter",
            RangeKind::Year => "year",
            RangeKind::All => "all",
        }
    }

    /// Range ending at `today`. `earliest` is the first stored date, used by
    /// [`RangeKind::All`]; without one the range is `today` only.
    pub fn resolve(self, today: NaiveDate, earliest: Option<NaiveDate>) -> DateRange {
        let start = match self {
            RangeKind::Day => today,
            RangeKind::Week => today.week(chrono::Weekday::Mon).first_day(),
            RangeKind::Month => today.with_day(1).unwrap_or(today),
            RangeKind::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(today.year(), first_month, 1).unwrap_or(today)
            }
            RangeKind::Year => today.with_ordinal(1).unwrap_or(today),
            RangeKind::All => earliest.map_or(today, |d| d.min(today)),
        };
        DateRange { start, end: today }
    }
}

impl FromStr for RangeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(RangeKind::Day),
            "week" => Ok(RangeKind::Week),
            "month" => Ok(RangeKind::Month),
            "quarter" => Ok(RangeKind::Quarter),
            "year" => Ok(RangeKind::Year),
            "all" => Ok(RangeKind::All),
            _ => Err(ValidationError::InvalidRange(s.to_string())),
        }
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Every date from `start` to `end`, inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl Storage {
    /// Resolve `keyword` against today's date.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidRange`] for an unknown keyword.
    pub fn date_range(&self, keyword: &str) -> Result<DateRange, ValidationError> {
        self.date_range_on(keyword, Local::now().date_naive())
    }

    pub fn date_range_on(
        &self,
        keyword: &str,
        today: NaiveDate,
    ) -> Result<DateRange, ValidationError> {
        let kind: RangeKind = keyword.parse()?;
        let earliest = match kind {
            RangeKind::All => match self.available_days() {
                Ok(days) => days.first().copied(),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot list days, range starts today");
                    None
                }
            },
            _ => None,
        };
        Ok(kind.resolve(today, earliest))
    }
}
