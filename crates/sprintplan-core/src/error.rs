//! Core error types for sprintplan-core.
//!
//! The allocation engine itself never fails on well-formed input; these
//! errors come from the layers around it: configuration, snapshot
//! ingestion and tracker execution.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sprintplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot ingestion errors
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Tracker errors that abort the whole run
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Could not resolve the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Errors raised while reading a planning snapshot.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Snapshot file could not be read
    #[error("Failed to read snapshot {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not valid JSON for the expected shape
    #[error("Failed to parse snapshot {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot file could not be written back
    #[error("Failed to write snapshot {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },
}

/// Errors reported by a [`crate::executor::Tracker`].
///
/// Only [`TrackerError::Unavailable`] aborts an execution run; every other
/// variant is recorded against the item it concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The tracker cannot be reached at all
    #[error("tracker unavailable: {0}")]
    Unavailable(String),

    /// The referenced item or member does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The tracker refused the mutation
    #[error("rejected: {0}")]
    Rejected(String),

    /// No transition leads to the initial active status
    #[error("No \"To Do\" transition available for {0}")]
    NoTransition(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
