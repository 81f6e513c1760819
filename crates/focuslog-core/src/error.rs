//! Core error types for focuslog-core.
//!
//! This module defines the error hierarchy using thiserror. Storage errors
//! name the step that failed; validation errors are returned before any
//! mutation happens.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuslog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create the data or backup directory
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to generate, load or persist the encryption key
    #[error("Failed to prepare encryption key: {0}")]
    Key(String),

    /// Failed to read a file
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to list the data directory
    #[error("Failed to list data directory {path}: {source}")]
    ListDays {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encryption failed
    #[error("Failed to encrypt sessions: {0}")]
    Encrypt(String),

    /// Decryption or authentication failed
    #[error("Failed to decrypt sessions: {0}")]
    Decrypt(String),

    /// Stored payload could not be parsed
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Sessions could not be serialized
    #[error("Failed to serialize sessions: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Import file contains a key that is not a `YYYY-MM-DD` date
    #[error("Invalid date in import: {0}")]
    InvalidImportDate(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home or config directory could not be determined
    #[error("Cannot determine configuration directory")]
    NoConfigDir,
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Unknown date-range keyword
    #[error("Invalid range type: {0} (expected day, week, month, quarter, year or all)")]
    InvalidRange(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Merge was asked to merge a session with itself
    #[error("Cannot merge session {0} with itself")]
    SameSession(usize),

    #[error("Cannot start a new session while one is active")]
    SessionAlreadyActive,

    #[error("No active session")]
    NoActiveSession,

    #[error("Already interrupted; return from the interruption first")]
    AlreadyInterrupted,

    #[error("Not currently interrupted")]
    NotInterrupted,

    #[error("Cannot end session while interrupted; return from the interruption first")]
    EndWhileInterrupted,

    #[error("Session {0} has not ended, nothing to resume")]
    SessionNotEnded(usize),

    #[error("Session {0} is still active and cannot be merged")]
    MergeActive(usize),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
