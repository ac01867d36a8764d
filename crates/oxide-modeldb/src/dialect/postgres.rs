//! PostgreSQL dialect.
//!
//! Error codes are SQLSTATE values.

use super::{Dialect, ErrorClass, IsolationLevel};

/// SQLSTATE `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn classify_code(&self, code: &str) -> ErrorClass {
        match code {
            UNIQUE_VIOLATION => ErrorClass::DuplicateEntry,
            SERIALIZATION_FAILURE => ErrorClass::SerializationConflict,
            _ => ErrorClass::Other,
        }
    }

    fn isolation_statement(&self, level: IsolationLevel) -> Option<String> {
        Some(format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_code() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.classify_code("23505"), ErrorClass::DuplicateEntry);
        assert_eq!(
            dialect.classify_code("40001"),
            ErrorClass::SerializationConflict
        );
        // foreign_key_violation
        assert_eq!(dialect.classify_code("23503"), ErrorClass::Other);
    }

    #[test]
    fn test_isolation_statement() {
        assert_eq!(
            PostgresDialect.isolation_statement(IsolationLevel::Serializable),
            Some(String::from("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE"))
        );
        assert_eq!(
            PostgresDialect.isolation_statement(IsolationLevel::ReadCommitted),
            Some(String::from("SET TRANSACTION ISOLATION LEVEL READ COMMITTED"))
        );
    }
}
