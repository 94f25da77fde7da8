//! Error taxonomy for storage and task operations.
//!
//! [`StorageError`] is the engine-level failure: a classified wrapper around
//! a native `rusqlite`/`r2d2` error. [`TaskError`] is what repository callers
//! see, adding validation and not-found outcomes on top.

use std::fmt;

use rusqlite::ErrorCode;
use taskline_core::{TaskId, ValidationError};
use thiserror::Error;

/// Broad class of a storage failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The store could not be opened, reached, or locked in time.
    ConnectionFailure,
    /// A schema constraint (NOT NULL, CHECK, UNIQUE, ...) rejected the write.
    ConstraintViolation,
    /// Any other driver failure.
    Unknown,
}

impl StorageErrorKind {
    /// Stable snake-case name, used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionFailure => "connection_failure",
            Self::ConstraintViolation => "constraint_violation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A native storage failure, classified.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct StorageError {
    /// Failure class.
    pub kind: StorageErrorKind,
    /// The driver's message.
    pub message: String,
}

impl StorageError {
    /// Build an error of the given kind.
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        let kind = match &err {
            rusqlite::Error::SqliteFailure(native, _) => match native.code {
                ErrorCode::ConstraintViolation => StorageErrorKind::ConstraintViolation,
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::PermissionDenied
                | ErrorCode::SystemIoFailure => StorageErrorKind::ConnectionFailure,
                _ => StorageErrorKind::Unknown,
            },
            rusqlite::Error::InvalidPath(_) => StorageErrorKind::ConnectionFailure,
            _ => StorageErrorKind::Unknown,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        Self::new(StorageErrorKind::ConnectionFailure, err.to_string())
    }
}

/// Errors from task repository operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Input failed validation; nothing was written.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No task with this id exists.
    #[error("task not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: TaskId,
    },

    /// The storage engine failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TaskError {
    /// Create a not-found error for a task id.
    pub fn not_found(id: TaskId) -> Self {
        Self::NotFound { id }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn native(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some("boom".into()))
    }

    #[test]
    fn constraint_codes_classified() {
        let err = StorageError::from(native(ffi::SQLITE_CONSTRAINT_NOTNULL));
        assert_eq!(err.kind, StorageErrorKind::ConstraintViolation);
        let err = StorageError::from(native(ffi::SQLITE_CONSTRAINT_CHECK));
        assert_eq!(err.kind, StorageErrorKind::ConstraintViolation);
    }

    #[test]
    fn connection_codes_classified() {
        for code in [ffi::SQLITE_CANTOPEN, ffi::SQLITE_BUSY, ffi::SQLITE_LOCKED, ffi::SQLITE_NOTADB] {
            let err = StorageError::from(native(code));
            assert_eq!(err.kind, StorageErrorKind::ConnectionFailure, "code {code}");
        }
    }

    #[test]
    fn other_failures_are_unknown() {
        assert_eq!(
            StorageError::from(native(ffi::SQLITE_ERROR)).kind,
            StorageErrorKind::Unknown
        );
        assert_eq!(
            StorageError::from(rusqlite::Error::QueryReturnedNoRows).kind,
            StorageErrorKind::Unknown
        );
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::new(StorageErrorKind::ConstraintViolation, "NOT NULL constraint failed: tasks.title");
        assert_eq!(
            err.to_string(),
            "constraint_violation: NOT NULL constraint failed: tasks.title"
        );
    }

    #[test]
    fn task_not_found_display() {
        assert_eq!(TaskError::not_found(42).to_string(), "task not found: 42");
    }

    #[test]
    fn validation_converts() {
        let err: TaskError = ValidationError::FieldEmpty { field: "title" }.into();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(err.to_string(), "validation error: title cannot be empty");
    }

    #[test]
    fn storage_converts() {
        let err: TaskError = StorageError::new(StorageErrorKind::Unknown, "x").into();
        assert!(matches!(err, TaskError::Storage(_)));
    }
}
