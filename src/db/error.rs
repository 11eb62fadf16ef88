//! Database error types.

use derive_more::{Display, Error};
use diesel::result::DatabaseErrorKind;
use tracing::instrument;

/// Category of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DbErrorKind {
    /// The store could not be opened or configured.
    #[display("startup failure")]
    StartupFailure,
    /// Schema synchronization failed.
    #[display("schema")]
    Schema,
    /// A uniqueness constraint was broken by a write.
    #[display("constraint violation")]
    ConstraintViolation,
    /// A write was rejected or failed.
    #[display("write error")]
    Write,
    /// A read failed.
    #[display("read error")]
    Read,
    /// A record required by a workflow does not exist.
    #[display("not found")]
    NotFound,
}

/// Database error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Database error ({}): {} at {}:{}", kind, message, file, line)]
pub struct DbError {
    /// Failure category.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a new database error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Classifies a failed insert: uniqueness breaches become
    /// [`DbErrorKind::ConstraintViolation`], everything else [`DbErrorKind::Write`].
    #[track_caller]
    pub fn write(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::new(DbErrorKind::ConstraintViolation, info.message().to_string())
            }
            other => Self::new(DbErrorKind::Write, format!("Diesel error: {}", other)),
        }
    }

    /// Returns true if this error is a uniqueness breach.
    pub fn is_constraint_violation(&self) -> bool {
        self.kind == DbErrorKind::ConstraintViolation
    }
}

// Reads go through `?`; writes classify explicitly with `DbError::write`.
impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Read, format!("Diesel error: {}", err))
    }
}
