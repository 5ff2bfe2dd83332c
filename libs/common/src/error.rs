//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A stored value could not be mapped onto a model
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors reported by the attendance engine
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// The user already has a check-in for the current UTC day
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    /// The backing store could not be reached or rejected the query
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DatabaseError),
}

/// Type alias for Result with AttendanceError
pub type AttendanceResult<T> = Result<T, AttendanceError>;
