//! Placeholder translation errors.

use thiserror::Error;

/// A statement could not be split into segments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Byte offset where the offending construct starts.
    pub position: usize,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Creates an "unterminated string literal" error.
    #[must_use]
    pub fn unterminated_literal(position: usize) -> Self {
        Self::new("Unterminated string literal", position)
    }
}
