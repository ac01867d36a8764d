//! SQLite dialect.
//!
//! Error codes are extended result codes, as reported by the driver in
//! decimal.

use super::{Dialect, ErrorClass, IsolationLevel};

/// `SQLITE_CONSTRAINT_UNIQUE`.
pub const CONSTRAINT_UNIQUE: &str = "2067";

/// `SQLITE_CONSTRAINT_PRIMARYKEY`.
pub const CONSTRAINT_PRIMARYKEY: &str = "1555";

/// `SQLITE_BUSY`.
pub const BUSY: &str = "5";

/// `SQLITE_BUSY_RECOVERY`.
pub const BUSY_RECOVERY: &str = "261";

/// `SQLITE_BUSY_SNAPSHOT`.
pub const BUSY_SNAPSHOT: &str = "517";

/// `SQLITE_BUSY_TIMEOUT`.
pub const BUSY_TIMEOUT: &str = "773";

/// SQLite dialect.
///
/// SQLite transactions are always serializable, so no isolation statement
/// is issued. A busy database is the closest equivalent of a serialization
/// failure and is retried as one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn classify_code(&self, code: &str) -> ErrorClass {
        match code {
            CONSTRAINT_UNIQUE | CONSTRAINT_PRIMARYKEY => ErrorClass::DuplicateEntry,
            BUSY | BUSY_RECOVERY | BUSY_SNAPSHOT | BUSY_TIMEOUT => {
                ErrorClass::SerializationConflict
            }
            _ => ErrorClass::Other,
        }
    }

    fn isolation_statement(&self, _level: IsolationLevel) -> Option<String> {
        None
    }
}
