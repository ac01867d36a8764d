//! Row materialization.
//!
//! A result row is copied into a list of destinations: scalar slots and
//! whole records. Each record contributes one column per mapped field, in
//! definition order, autoincrement fields included. Nullable fields are
//! scanned through a nullable target; a NULL there leaves the field at its
//! zero value (or `None` for `Option` fields).

use crate::error::{MappingError, Result, ValueError};
use crate::registry::Registry;
use crate::schema::Record;
use crate::value::{FromSqlValue, SqlKind, SqlType, SqlValue};

/// How a single column is read from the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTarget {
    /// The column is read as the given kind and must not be NULL.
    Direct(SqlKind),
    /// The column may be NULL.
    Nullable(SqlKind),
}

impl ScanTarget {
    /// Returns the nullable target for `kind`, if it has one.
    ///
    /// Opaque kinds decode themselves and have no nullable wrapper.
    #[must_use]
    pub const fn nullable(kind: SqlKind) -> Option<Self> {
        match kind {
            SqlKind::Opaque => None,
            _ => Some(Self::Nullable(kind)),
        }
    }

    /// Returns the scalar kind read.
    #[must_use]
    pub const fn kind(&self) -> SqlKind {
        match self {
            Self::Direct(kind) | Self::Nullable(kind) => *kind,
        }
    }

    /// Returns true for a nullable target.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }
}

/// A source row that can decode its columns into scan targets.
pub trait Scanner {
    /// The error produced when a column cannot be decoded.
    type Error;

    /// Decodes one value per target, in column order.
    ///
    /// # Errors
    ///
    /// Returns an error if the column count differs from `targets.len()` or
    /// a column cannot be read as its target.
    fn scan(&self, targets: &[ScanTarget]) -> std::result::Result<Vec<SqlValue>, Self::Error>;
}

/// A scalar destination.
pub trait ScalarSlot: Send {
    /// The scalar kind read into this slot.
    fn kind(&self) -> SqlKind;

    /// Whether the slot accepts NULL.
    fn nullable(&self) -> bool;

    /// Stores a decoded value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the value does not fit.
    fn assign(&mut self, value: SqlValue) -> std::result::Result<(), ValueError>;

    /// Returns the slot's type name, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: SqlType + FromSqlValue + Send> ScalarSlot for T {
    fn kind(&self) -> SqlKind {
        T::KIND
    }

    fn nullable(&self) -> bool {
        T::NULLABLE
    }

    fn assign(&mut self, value: SqlValue) -> std::result::Result<(), ValueError> {
        *self = T::from_sql_value(value)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// One destination of a materialized row.
pub enum Dest<'a> {
    /// A scalar slot consuming one column.
    Scalar(&'a mut dyn ScalarSlot),
    /// A record consuming one column per mapped field.
    Record(&'a mut dyn Record),
}

impl<'a> Dest<'a> {
    /// Wraps a scalar destination.
    #[must_use]
    pub fn scalar<T: ScalarSlot>(slot: &'a mut T) -> Self {
        Self::Scalar(slot)
    }

    /// Wraps a record destination.
    #[must_use]
    pub fn record<R: Record>(record: &'a mut R) -> Self {
        Self::Record(record)
    }
}

impl std::fmt::Debug for Dest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(slot) => f.debug_tuple("Scalar").field(&slot.type_name()).finish(),
            Self::Record(r) => f.debug_tuple("Record").field(&r.model_def().type_name).finish(),
        }
    }
}

/// Computes the scan targets for a destination list.
///
/// # Errors
///
/// Returns a [`MappingError`] if a record's metadata is invalid, or a
/// nullable field has a kind without a nullable wrapper.
pub fn plan_targets(registry: &Registry, dests: &[Dest<'_>]) -> Result<Vec<ScanTarget>> {
    let mut targets = Vec::with_capacity(dests.len());
    for dest in dests {
        match dest {
            Dest::Scalar(slot) => {
                let kind = slot.kind();
                let target = if slot.nullable() {
                    ScanTarget::nullable(kind).unwrap_or(ScanTarget::Direct(kind))
                } else {
                    ScanTarget::Direct(kind)
                };
                targets.push(target);
            }
            Dest::Record(record) => {
                let info = registry.describe_record(&**record)?;
                for field in &info.fields {
                    let target = if field.accepts_null() {
                        ScanTarget::nullable(field.kind).ok_or(MappingError::NoNullableWrapper {
                            model: info.type_name,
                            field: field.ident,
                            kind: field.kind,
                        })?
                    } else {
                        ScanTarget::Direct(field.kind)
                    };
                    targets.push(target);
                }
            }
        }
    }
    Ok(targets)
}

/// Copies one row into `dests`.
///
/// # Errors
///
/// Returns the scanner's error, or a [`MappingError`] converted into it if
/// planning fails or a decoded value does not fit its destination.
pub fn materialize<S>(
    registry: &Registry,
    row: &S,
    dests: &mut [Dest<'_>],
) -> std::result::Result<(), S::Error>
where
    S: Scanner + ?Sized,
    S::Error: From<MappingError>,
{
    let targets = plan_targets(registry, dests)?;
    let values = row.scan(&targets)?;
    if values.len() != targets.len() {
        return Err(MappingError::ColumnCount {
            columns: values.len(),
            targets: targets.len(),
        }
        .into());
    }

    let mut values = values.into_iter().enumerate();
    for dest in dests.iter_mut() {
        match dest {
            Dest::Scalar(slot) => {
                let Some((position, value)) = values.next() else {
                    break;
                };
                slot.assign(value).map_err(|source| MappingError::Decode {
                    position,
                    target: String::from(slot.type_name()),
                    source,
                })?;
            }
            Dest::Record(record) => {
                let def = record.model_def();
                for (index, field) in def.fields.iter().enumerate() {
                    let Some((position, value)) = values.next() else {
                        break;
                    };
                    record
                        .set_field(index, value)
                        .map_err(|source| MappingError::Decode {
                            position,
                            target: format!("{}.{}", def.type_name, field.ident),
                            source,
                        })?;
                }
            }
        }
    }
    Ok(())
}
