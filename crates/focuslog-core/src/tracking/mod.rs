//! Session tracking model.
//!
//! - [`TimeEntry`]: atomic start/end/interruption/return events
//! - [`Session`] / [`SubSession`]: work sessions and their continuous periods
//! - [`DailySessions`]: the sessions stored in one day file
//! - [`Tracker`]: start/interrupt/return/end/resume commands over today's file

mod daily;
mod entry;
mod session;
mod tracker;

pub use daily::DailySessions;
pub use entry::{EntryType, InterruptionTag, TimeEntry};
pub use session::{Session, SubSession};
pub use tracker::Tracker;

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
