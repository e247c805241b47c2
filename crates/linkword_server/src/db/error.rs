//! Database error types.

use derive_more::{Display, Error};
use diesel::result::DatabaseErrorKind;
use linkword::{RepositoryError, RepositoryErrorKind};
use tracing::instrument;

/// Database error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Database error ({}): {} at {}:{}", kind, message, file, line)]
pub struct DbError {
    /// Failure class, as reported to the engine.
    pub kind: RepositoryErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a backend error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(RepositoryErrorKind::Backend, message)
    }

    /// Creates an error of the given class with caller location tracking.
    #[track_caller]
    pub fn with_kind(kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A missing row.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(RepositoryErrorKind::NotFound, message)
    }

    /// A lost conditional write or uniqueness clash.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(RepositoryErrorKind::Conflict, message)
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::not_found("Row not found"),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::conflict(format!("Unique violation: {}", info.message()))
            }
            other => Self::new(format!("Diesel error: {}", other)),
        }
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}

impl From<serde_json::Error> for DbError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON column error: {}", err))
    }
}

impl From<DbError> for RepositoryError {
    fn from(err: DbError) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
            line: err.line,
            file: err.file,
        }
    }
}
