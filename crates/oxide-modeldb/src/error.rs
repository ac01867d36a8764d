//! Error types and backend error classification.

use oxide_modeldb_core::{MappingError, ParseError};

use crate::dialect::{Dialect, ErrorClass};

/// The taxonomy tag of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A uniqueness constraint was violated.
    DuplicateEntry,
    /// The backend aborted the transaction to preserve serializability.
    /// Transient; retried by [`crate::retry::run`].
    SerializationConflict,
    /// Any other backend or driver failure.
    Other,
    /// The statement could not be split into placeholders and literals.
    ParseFailure,
    /// Record metadata or handle usage is wrong. Indicates a programming
    /// mistake.
    ConfigurationError,
    /// The implicit rollback of a failed transaction failed; the connection
    /// may be unusable.
    Unrecoverable,
}

/// Errors returned by database operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A uniqueness constraint was violated.
    #[error("Duplicate entry: {message}")]
    DuplicateEntry {
        /// The violated constraint, if the backend reports it.
        constraint: Option<String>,
        /// The backend message.
        message: String,
    },

    /// The backend reported a serialization failure.
    #[error("Serialization conflict: {message}")]
    SerializationConflict {
        /// The backend message.
        message: String,
    },

    /// Database or driver error that is not otherwise classified.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A single-row query returned no rows.
    #[error("Query returned no rows")]
    NotFound,

    /// The statement text is malformed.
    #[error("Malformed statement: {0}")]
    Parse(#[from] ParseError),

    /// Record metadata is invalid or does not match the row.
    #[error("Mapping error: {0}")]
    Configuration(#[from] MappingError),

    /// The connection URL names a backend without a dialect.
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// Connection settings are missing or malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Commit or rollback on a transaction that was already finalized.
    #[error("Transaction already finalized")]
    TransactionFinalized,

    /// Rolling back a failed transaction failed.
    #[error("Rollback failed: {0}")]
    RollbackFailed(Box<Error>),
}

impl Error {
    /// Returns the taxonomy tag.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateEntry { .. } => ErrorKind::DuplicateEntry,
            Self::SerializationConflict { .. } => ErrorKind::SerializationConflict,
            Self::Database(_) | Self::NotFound => ErrorKind::Other,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Configuration(_)
            | Self::UnsupportedBackend(_)
            | Self::InvalidConfig(_)
            | Self::TransactionFinalized => {
                ErrorKind::ConfigurationError
            }
            Self::RollbackFailed(_) => ErrorKind::Unrecoverable,
        }
    }

    /// Returns the raw backend message, if the error came from the backend.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::DuplicateEntry { message, .. } | Self::SerializationConflict { message } => {
                Some(message.as_str())
            }
            Self::Database(sqlx::Error::Database(db)) => Some(db.message()),
            Self::RollbackFailed(inner) => inner.message(),
            _ => None,
        }
    }

    /// Returns the violated constraint of a duplicate entry.
    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::DuplicateEntry { constraint, .. } => constraint.as_deref(),
            _ => None,
        }
    }

    /// Returns true for a serialization conflict.
    #[must_use]
    pub const fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::SerializationConflict { .. })
    }

    /// Returns true for a duplicate entry.
    #[must_use]
    pub const fn is_duplicate_entry(&self) -> bool {
        matches!(self, Self::DuplicateEntry { .. })
    }
}

/// Classifies a driver error using the dialect's code table.
///
/// Errors without a backend code, and codes the dialect does not know, are
/// returned as [`Error::Database`].
#[must_use]
pub fn classify(dialect: &dyn Dialect, err: sqlx::Error) -> Error {
    let class = match &err {
        sqlx::Error::Database(db) => db
            .code()
            .map_or(ErrorClass::Other, |code| dialect.classify_code(&code)),
        _ => ErrorClass::Other,
    };

    match (class, &err) {
        (ErrorClass::DuplicateEntry, sqlx::Error::Database(db)) => Error::DuplicateEntry {
            constraint: db.constraint().map(String::from),
            message: db.message().to_string(),
        },
        (ErrorClass::SerializationConflict, sqlx::Error::Database(db)) => {
            Error::SerializationConflict {
                message: db.message().to_string(),
            }
        }
        _ => Error::Database(err),
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;
