//! Record traits and compile-time field metadata.
//!
//! These are implemented by `#[derive(Model)]`. A hand-written implementation
//! builds the same metadata with the const builders on [`FieldDef`]:
//!
//! ```rust
//! use oxide_modeldb_core::schema::{FieldDef, ModelDef};
//! use oxide_modeldb_core::SqlKind;
//!
//! const ACCOUNT: ModelDef = ModelDef::new(
//!     "Account",
//!     &[
//!         FieldDef::new("id", "id", SqlKind::Int).autoincrement(),
//!         FieldDef::new("email", "email", SqlKind::Text).nullable(),
//!     ],
//! );
//! assert_eq!(ACCOUNT.fields.len(), 2);
//! ```

use std::any::Any;
use std::sync::Arc;

use crate::error::{MappingError, ValueError};
use crate::registry::{ModelInfo, Registry};
use crate::value::{SqlKind, SqlValue};

/// Metadata of one mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// The Rust field identifier.
    pub ident: &'static str,
    /// The SQL column name.
    pub column: &'static str,
    /// Whether the column was declared to hold NULL (`null` option).
    pub nullable: bool,
    /// Whether the field type holds NULL itself (`Option<T>`).
    pub optional: bool,
    /// Whether the database generates the value.
    pub autoincrement: bool,
    /// The field's scalar kind.
    pub kind: SqlKind,
}

impl FieldDef {
    /// Creates a plain field.
    #[must_use]
    pub const fn new(ident: &'static str, column: &'static str, kind: SqlKind) -> Self {
        Self {
            ident,
            column,
            nullable: false,
            optional: false,
            autoincrement: false,
            kind,
        }
    }

    /// Marks the field type as holding NULL itself.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Returns true if a NULL column can be read into the field.
    #[must_use]
    pub const fn accepts_null(&self) -> bool {
        self.nullable || self.optional
    }

    /// Marks the field as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the field as database generated.
    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }
}

/// Metadata of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDef {
    /// The Rust type name; the registry key.
    pub type_name: &'static str,
    /// Explicit table name. Defaults to the lower-cased type name.
    pub table: Option<&'static str>,
    /// Mapped fields in declaration order.
    pub fields: &'static [FieldDef],
}

impl ModelDef {
    /// Creates a record definition with the default table name.
    #[must_use]
    pub const fn new(type_name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self {
            type_name,
            table: None,
            fields,
        }
    }

    /// Overrides the table name.
    #[must_use]
    pub const fn with_table(mut self, table: &'static str) -> Self {
        self.table = Some(table);
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> String {
        self.table
            .map_or_else(|| self.type_name.to_lowercase(), String::from)
    }
}

/// A record whose mapped fields can be read and written by position.
///
/// This is the object-safe half of [`Model`]; argument and destination lists
/// hold `&dyn Record`. Field positions index [`ModelDef::fields`].
pub trait Record: Send + Sync {
    /// Returns the record's metadata.
    fn model_def(&self) -> &'static ModelDef;

    /// Returns the record as `Any`, for runtime type checks.
    fn as_any(&self) -> &dyn Any;

    /// Returns the values of all mapped fields, in definition order.
    fn field_values(&self) -> Vec<SqlValue>;

    /// Stores a decoded value into the mapped field at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the value does not fit the field, or if
    /// `index` is not a mapped field.
    fn set_field(&mut self, index: usize, value: SqlValue) -> Result<(), ValueError>;

    /// Returns, per mapped field, whether it holds its type's zero value.
    ///
    /// The default judges the converted values, which cannot tell `Some(0)`
    /// from `0`; the derive emits [`crate::ToSqlValue::is_zero_value`] per
    /// field instead.
    fn zero_fields(&self) -> Vec<bool> {
        self.field_values().iter().map(SqlValue::is_zero).collect()
    }
}

/// A record type with static metadata.
///
/// Implemented by `#[derive(Model)]`. `Default` supplies the blank instance
/// each result row is materialized into.
pub trait Model: Record + Default + Sized + 'static {
    /// The record's metadata.
    const DEF: &'static ModelDef;

    /// Returns the cached descriptor from the global registry.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] if the metadata is invalid.
    fn model_info() -> Result<Arc<ModelInfo>, MappingError> {
        Registry::global().describe::<Self>()
    }
}
