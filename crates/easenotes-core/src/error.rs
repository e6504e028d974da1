//! Core error types for easenotes-core.
//!
//! One thiserror hierarchy for the whole library. Collaborator errors
//! (`NotifyError`, `BackgroundError`) never abort a running countdown --
//! the timer logs them and keeps counting.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for easenotes-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Notification scheduling errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Background-execution grant errors
    #[error("Background execution error: {0}")]
    Background(#[from] BackgroundError),

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

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// No project row with the given id
    #[error("No project with id {0}")]
    ProjectNotFound(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Notification scheduling errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The user denied notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The platform scheduler rejected the request
    #[error("Failed to schedule notification: {0}")]
    ScheduleFailed(String),
}

/// Background-execution grant errors.
#[derive(Error, Debug)]
pub enum BackgroundError {
    /// The host refused to extend background run time
    #[error("Background execution grant denied")]
    GrantDenied,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
