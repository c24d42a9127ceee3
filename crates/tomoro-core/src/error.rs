//! Core error types for tomoro-core.
//!
//! The operation-level failure taxonomy is small: conflicts (an active timer
//! already exists, an email is already registered), not-found (no active
//! timer, unknown user) and invalid arguments (out-of-range settings).
//! Everything else is infrastructure (database, config, IO).

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`CoreError`], for transport layers that map
/// failures onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    InvalidArgument,
    Internal,
}

/// Core error type for tomoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An active timer already exists for this user (conflict).
    #[error("an active timer already exists")]
    ActiveTimerExists,

    /// The email is already registered (conflict).
    #[error("email is already registered: {0}")]
    EmailTaken(String),

    /// No active timer to stop or complete (not found).
    #[error("no active timer")]
    NoActiveTimer,

    /// The user does not exist (not found).
    #[error("unknown user: {0}")]
    UnknownUser(i64),

    /// Validation errors (invalid argument).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ActiveTimerExists | CoreError::EmailTaken(_) => ErrorKind::Conflict,
            CoreError::NoActiveTimer | CoreError::UnknownUser(_) => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::InvalidArgument,
            _ => ErrorKind::Internal,
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A uniqueness or check constraint was violated
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Migration failed
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A settings value is outside its allowed range.
    #[error("invalid value for '{field}': must be between {min} and {max} minutes")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },

    /// Unrecognized timer kind supplied at a boundary.
    #[error("invalid timer kind: '{0}' (expected work, short_break or long_break)")]
    UnknownTimerKind(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked => DatabaseError::Locked,
                rusqlite::ErrorCode::ConstraintViolation => {
                    DatabaseError::Constraint(msg.clone().unwrap_or_else(|| code.to_string()))
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
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
