//! Core error types for streakwise-core.
//!
//! Every failure a user can trigger ends up as a [`CoreError`]; its `Display`
//! output is the message the CLI shows.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskTransitionError;

/// Core error type for streakwise-core.
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

    /// The task was deleted (or never existed) before the operation ran
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Lifecycle action not allowed from the task's current status
    #[error(transparent)]
    Transition(#[from] TaskTransitionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable data directory
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),
}

/// Validation errors for user-entered data.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Title empty after trimming
    #[error("Task title must not be empty")]
    EmptyTitle,

    /// Weekly schedule with no weekdays selected
    #[error("Recurrence schedule must include at least one weekday")]
    EmptySchedule,

    /// Recurring flag and schedule disagree
    #[error("Recurring tasks need a schedule and one-off tasks must not have one")]
    ScheduleMismatch,

    /// Due date earlier than start date
    #[error("Due date {due} is before start date {start}")]
    DueBeforeStart {
        due: chrono::NaiveDate,
        start: chrono::NaiveDate,
    },

    /// Completion date in the future
    #[error("Completion date {0} is in the future")]
    FutureCompletion(chrono::NaiveDate),

    /// Completion date before the task started
    #[error("Completion date {day} is before the task start date {start}")]
    CompletionBeforeStart {
        day: chrono::NaiveDate,
        start: chrono::NaiveDate,
    },

    /// No completion recorded on the day being edited
    #[error("No completion recorded on {0}")]
    NoCompletionOn(chrono::NaiveDate),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                ) =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
