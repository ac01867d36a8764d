//! Error types for record mapping.

use thiserror::Error;

use crate::value::{SqlKind, SqlValue};

/// A single value could not be converted into a field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The decoded value has a kind the field cannot hold.
    #[error("expected {expected} value, found {found}")]
    Mismatch {
        /// The kind the field holds.
        expected: SqlKind,
        /// The kind of the decoded value.
        found: &'static str,
    },

    /// An integer does not fit the field's narrower integer type.
    #[error("value {value} out of range for {target}")]
    OutOfRange {
        /// The Rust type of the field.
        target: &'static str,
        /// The decoded value.
        value: i64,
    },

    /// A record was asked to set a field index it does not have.
    #[error("no mapped field at index {index}")]
    UnknownField {
        /// The requested index.
        index: usize,
    },
}

impl ValueError {
    /// Creates a kind mismatch error for a decoded value.
    #[must_use]
    pub const fn mismatch(expected: SqlKind, found: &SqlValue) -> Self {
        Self::Mismatch {
            expected,
            found: found.kind_name(),
        }
    }
}

/// Errors caused by record metadata or its use.
///
/// These indicate a programming mistake rather than a runtime condition and
/// are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The record type declares no mapped fields.
    #[error("model {model} has no mapped fields")]
    NoMappedFields {
        /// The record type name.
        model: &'static str,
    },

    /// A field's metadata is invalid.
    #[error("invalid metadata on {model}.{field}: {reason}")]
    InvalidField {
        /// The record type name.
        model: &'static str,
        /// The field identifier.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A record's runtime type differs from the descriptor cached under its name.
    #[error("type mismatch for model {model}: descriptor was built for a different type")]
    TypeMismatch {
        /// The record type name.
        model: &'static str,
    },

    /// A nullable field's kind has no nullable scan target.
    #[error("no nullable wrapper for {kind} field {model}.{field}")]
    NoNullableWrapper {
        /// The record type name.
        model: &'static str,
        /// The field identifier.
        field: &'static str,
        /// The field's kind.
        kind: SqlKind,
    },

    /// The record produced a different number of values than it has fields.
    #[error("model {model} produced {found} values for {expected} mapped fields")]
    FieldCount {
        /// The record type name.
        model: &'static str,
        /// Number of mapped fields.
        expected: usize,
        /// Number of values produced.
        found: usize,
    },

    /// The row has a different number of columns than there are scan targets.
    #[error("row has {columns} columns but {targets} scan targets were requested")]
    ColumnCount {
        /// Number of columns in the row.
        columns: usize,
        /// Number of scan targets.
        targets: usize,
    },

    /// A decoded column could not be stored into its destination.
    #[error("cannot decode column {position} ({target}): {source}")]
    Decode {
        /// Zero-based position of the column in the row.
        position: usize,
        /// Field or slot description.
        target: String,
        /// The underlying conversion error.
        #[source]
        source: ValueError,
    },
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
