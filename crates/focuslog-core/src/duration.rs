//! Duration helpers shared by the statistics and CLI output.

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a [`Duration`] as whole seconds.
pub mod seconds {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(deserializer)?))
    }
}

/// Serialize a map of [`Duration`] values as whole seconds.
pub mod seconds_map {
    use super::*;
    use serde::ser::SerializeMap;
    use serde::Serialize;
    use std::collections::BTreeMap;

    pub fn serialize<K, S>(map: &BTreeMap<K, Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            out.serialize_entry(key, &value.num_seconds())?;
        }
        out.end()
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, Duration>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<K, i64>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(k, secs)| (k, Duration::seconds(secs)))
            .collect())
    }
}

/// `d * count`, saturating at the bounds of [`Duration`].
pub fn saturating_mul(d: Duration, count: usize) -> Duration {
    let factor = i32::try_from(count).unwrap_or(i32::MAX);
    d.checked_mul(factor).unwrap_or(if d < Duration::zero() {
        Duration::MIN
    } else {
        Duration::MAX
    })
}

/// Mean of `total` over `count` items; zero when there are none.
pub fn average(total: Duration, count: usize) -> Duration {
    match count {
        0 => Duration::zero(),
        n => total / i32::try_from(n).unwrap_or(i32::MAX),
    }
}

/// `HH:MM:SS` clock format.
pub fn format_clock(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Short human format: `1h 5m`, `5m 3s` or `42s`.
pub fn format_human(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
