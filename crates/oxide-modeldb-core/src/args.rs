//! Argument expansion.
//!
//! A statement's arguments may freely mix scalars and whole records. Before
//! binding, every record is flattened into its insertable field values, so
//! a record lines up with the `fields_insert`/`placeholders` strings of its
//! descriptor:
//!
//! ```rust,ignore
//! let info = User::model_info()?;
//! let sql = format!(
//!     "INSERT INTO {} ({}) VALUES ({})",
//!     info.table_name, info.fields_insert, info.placeholders
//! );
//! db.exec(&sql, &[Arg::record(&user)]).await?;
//! ```

use crate::error::{MappingError, Result};
use crate::registry::{ModelInfo, Registry};
use crate::schema::Record;
use crate::value::{SqlValue, ToSqlValue};

/// One statement argument.
///
/// Any [`ToSqlValue`] converts into a scalar argument with `into()`; records
/// are wrapped with [`Arg::record`].
#[derive(Clone)]
pub enum Arg<'a> {
    /// A scalar, bound as-is. NULL stands for a nullable scalar without value.
    Value(SqlValue),
    /// A record, expanded into its insertable field values.
    Record(&'a dyn Record),
}

impl<'a> Arg<'a> {
    /// Wraps a record argument.
    #[must_use]
    pub fn record<R: Record>(record: &'a R) -> Self {
        Self::Record(record)
    }
}

impl<T: ToSqlValue> From<T> for Arg<'_> {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl std::fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Record(r) => f.debug_tuple("Record").field(&r.model_def().type_name).finish(),
        }
    }
}

impl ModelInfo {
    /// Flattens a record into its insertable field values.
    ///
    /// Autoincrement fields are omitted. Fields declared nullable and
    /// holding their type's zero value are sent as NULL; for `Option<T>`
    /// only `None` is zero.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] if `record` is not of the described type.
    pub fn insert_values(&self, record: &dyn Record) -> Result<Vec<SqlValue>> {
        self.check_type(record)?;

        let values = record.field_values();
        let zeros = record.zero_fields();
        for found in [values.len(), zeros.len()] {
            if found != self.fields.len() {
                return Err(MappingError::FieldCount {
                    model: self.type_name,
                    expected: self.fields.len(),
                    found,
                });
            }
        }

        Ok(self
            .fields
            .iter()
            .zip(values.into_iter().zip(zeros))
            .filter(|(field, _)| !field.autoincrement)
            .map(|(field, (value, zero))| {
                if field.nullable && zero {
                    SqlValue::Null
                } else {
                    value
                }
            })
            .collect())
    }
}

/// Expands an argument list into positional values.
///
/// Scalars pass through; each record is replaced in place by
/// [`ModelInfo::insert_values`].
///
/// # Errors
///
/// Returns a [`MappingError`] if a record's metadata is invalid or its type
/// does not match its descriptor.
pub fn expand_args(registry: &Registry, args: &[Arg<'_>]) -> Result<Vec<SqlValue>> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Arg::Value(value) => values.push(value.clone()),
            Arg::Record(record) => {
                let info = registry.describe_record(*record)?;
                values.extend(info.insert_values(*record)?);
            }
        }
    }
    Ok(values)
}
