//! Day file schema versioning and migrations.
//!
//! Every day file is wrapped with a `schema_version` tag. Files written
//! before versioning existed have no tag and are treated as version 0.
//! Migrations are applied in order when a day is loaded.

use serde::{Deserialize, Serialize};

use crate::tracking::DailySessions;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct VersionedDayRef<'a> {
    schema_version: u32,
    #[serde(flatten)]
    day: &'a DailySessions,
}

#[derive(Deserialize)]
struct VersionedDay {
    schema_version: u32,
    #[serde(flatten)]
    day: DailySessions,
}

/// Serialize a day wrapped with the current schema version.
pub fn encode(day: &DailySessions) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(&VersionedDayRef {
        schema_version: CURRENT_SCHEMA_VERSION,
        day,
    })
}

/// Parse a day file, returning the day and the schema version it was
/// written with.
///
/// A payload without a usable version wrapper is parsed as an unversioned
/// day (version 0). If neither parse succeeds, the wrapped parse error is
/// returned.
pub fn decode(bytes: &[u8]) -> serde_json::Result<(DailySessions, u32)> {
    match serde_json::from_slice::<VersionedDay>(bytes) {
        Ok(versioned) => Ok((versioned.day, versioned.schema_version)),
        Err(wrapped_err) => match serde_json::from_slice::<DailySessions>(bytes) {
            Ok(day) => Ok((day, 0)),
            Err(_) => Err(wrapped_err),
        },
    }
}

/// Apply all pending migrations to bring `day` to the current schema
/// version. Returns `true` if anything changed.
pub fn migrate(day: &mut DailySessions, version: u32) -> bool {
    let mut changed = false;

    // Apply migrations sequentially
    if version < 1 {
        changed |= migrate_v1(day);
    }

    if changed {
        tracing::debug!(date = %day.date, from = version, "migrated day file");
    }
    changed
}

/// Migration v1: assign ids to sessions that lack one.
fn migrate_v1(day: &mut DailySessions) -> bool {
    let mut changed = false;
    for session in &mut day.sessions {
        changed |= session.ensure_id();
    }
    changed
}
