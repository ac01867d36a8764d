//! Backend dialects.
//!
//! Each dialect knows its backend's error codes and how to set a
//! transaction's isolation level.

mod postgres;
mod sqlite;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Classification of a backend error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Uniqueness or primary key violation.
    DuplicateEntry,
    /// Transient serialization failure; the transaction may be retried.
    SerializationConflict,
    /// Anything else.
    Other,
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    /// READ UNCOMMITTED.
    ReadUncommitted,
    /// READ COMMITTED.
    #[default]
    ReadCommitted,
    /// REPEATABLE READ.
    RepeatableRead,
    /// SERIALIZABLE.
    Serializable,
}

impl IsolationLevel {
    /// Returns the SQL keyword form of the level.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Trait for backend-specific behavior.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Classifies a backend error code.
    fn classify_code(&self, code: &str) -> ErrorClass;

    /// Returns the statement setting the isolation level of the current
    /// transaction, or `None` if the backend has no such statement.
    fn isolation_statement(&self, level: IsolationLevel) -> Option<String>;
}

/// Selects the dialect for a connection URL by its scheme.
///
/// # Errors
///
/// Returns [`Error::UnsupportedBackend`] for any scheme other than
/// `postgres`, `postgresql` and `sqlite`.
pub fn for_url(url: &str) -> Result<Arc<dyn Dialect>> {
    let scheme = url.split(':').next().unwrap_or_default();
    match scheme {
        "postgres" | "postgresql" => Ok(Arc::new(PostgresDialect)),
        "sqlite" => Ok(Arc::new(SqliteDialect)),
        _ => Err(Error::UnsupportedBackend(scheme.to_string())),
    }
}
