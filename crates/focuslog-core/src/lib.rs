//! # Focuslog Core Library
//!
//! This library provides the core logic for focuslog, an interruption-aware
//! work session tracker. All operations are available through the
//! standalone CLI binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Tracking**: Sessions made of sub-sessions, each recording its
//!   interruption/return entries
//! - **Accounting**: Work and interruption time derived from those entries
//! - **Statistics**: Per-tag interruption stats and range-level productivity
//!   analytics
//! - **Storage**: One JSON file per day, optionally AES-256-GCM encrypted,
//!   versioned and backed up; TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Tracker`]: Session lifecycle over today's sessions
//! - [`Storage`]: Day file persistence and range queries
//! - [`Config`]: Application configuration management
//! - [`DetailedStats`]: Productivity analytics over a date range

pub mod accounting;
pub mod duration;
pub mod error;
pub mod stats;
pub mod storage;
pub mod tracking;

pub use accounting::{RecoveryPolicy, Totals, DEFAULT_RECOVERY_MINUTES};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use stats::{DetailedStats, InterruptionTagStats};
pub use storage::{Config, DateRange, Encryption, ImportSummary, RangeKind, Storage, StorageOptions};
pub use tracking::{
    DailySessions, EntryType, InterruptionTag, Session, SubSession, TimeEntry, Tracker,
};
