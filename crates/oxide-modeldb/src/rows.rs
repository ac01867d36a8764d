//! Result rows and cursors.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::TryStreamExt;
use oxide_modeldb_core::{
    Dest, MappingError, Registry, ScanTarget, Scanner, SqlKind, SqlValue, materialize,
};
use sqlx::any::AnyRow;
use sqlx::error::UnexpectedNullError;
use sqlx::{Column, Row, ValueRef};

use crate::dialect::Dialect;
use crate::error::{Error, Result, classify};

/// A single result row.
pub struct ModelRow {
    row: AnyRow,
}

impl ModelRow {
    pub(crate) const fn new(row: AnyRow) -> Self {
        Self { row }
    }

    /// Copies the row into scalar slots and records.
    ///
    /// Each record consumes one column per mapped field, in definition
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the destinations do not match the
    /// row, or [`Error::Database`] if a column cannot be decoded.
    pub fn scan(&self, dests: &mut [Dest<'_>]) -> Result<()> {
        materialize(Registry::global(), self, dests)
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Returns the underlying driver row.
    #[must_use]
    pub const fn as_any_row(&self) -> &AnyRow {
        &self.row
    }
}

impl std::fmt::Debug for ModelRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRow")
            .field("columns", &self.columns())
            .finish()
    }
}

impl Scanner for ModelRow {
    type Error = Error;

    fn scan(&self, targets: &[ScanTarget]) -> Result<Vec<SqlValue>> {
        let columns = self.row.len();
        if columns != targets.len() {
            return Err(MappingError::ColumnCount {
                columns,
                targets: targets.len(),
            }
            .into());
        }

        targets
            .iter()
            .enumerate()
            .map(|(index, target)| decode_column(&self.row, index, *target).map_err(Error::Database))
            .collect()
    }
}

fn decode_column(
    row: &AnyRow,
    index: usize,
    target: ScanTarget,
) -> std::result::Result<SqlValue, sqlx::Error> {
    let is_null = row.try_get_raw(index)?.is_null();
    match target {
        ScanTarget::Nullable(_) if is_null => Ok(SqlValue::Null),
        ScanTarget::Direct(SqlKind::Opaque) => decode_dynamic(row, index),
        ScanTarget::Direct(_) if is_null => Err(sqlx::Error::ColumnDecode {
            index: index.to_string(),
            source: Box::new(UnexpectedNullError),
        }),
        target => decode_typed(row, index, target.kind()),
    }
}

fn decode_typed(
    row: &AnyRow,
    index: usize,
    kind: SqlKind,
) -> std::result::Result<SqlValue, sqlx::Error> {
    let typed = match kind {
        SqlKind::Bool => row.try_get(index).map(SqlValue::Bool),
        SqlKind::Int => row.try_get(index).map(SqlValue::Int),
        SqlKind::Float => row.try_get(index).map(SqlValue::Float),
        SqlKind::Text => row.try_get(index).map(SqlValue::Text),
        SqlKind::Blob => row.try_get(index).map(SqlValue::Blob),
        SqlKind::Opaque => return decode_dynamic(row, index),
    };
    match typed {
        // Column type differs from the field kind (e.g. SQLite has no
        // boolean storage class); the field conversion decides.
        Err(sqlx::Error::ColumnDecode { .. }) => decode_dynamic(row, index),
        other => other,
    }
}

/// Decodes a column by its runtime type.
fn decode_dynamic(row: &AnyRow, index: usize) -> std::result::Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(SqlValue::Int(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Ok(SqlValue::Float(v));
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Ok(SqlValue::Text(v));
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return Ok(SqlValue::Bool(v));
    }
    row.try_get::<Vec<u8>, _>(index).map(SqlValue::Blob)
}

/// A cursor over result rows.
pub struct ModelRows<'c> {
    stream: BoxStream<'c, std::result::Result<AnyRow, sqlx::Error>>,
    dialect: Arc<dyn Dialect>,
}

impl<'c> ModelRows<'c> {
    pub(crate) fn new(
        stream: BoxStream<'c, std::result::Result<AnyRow, sqlx::Error>>,
        dialect: Arc<dyn Dialect>,
    ) -> Self {
        Self { stream, dialect }
    }

    /// Advances to the next row, or returns `None` at the end.
    ///
    /// # Errors
    ///
    /// Returns the classified backend error if fetching fails.
    pub async fn next(&mut self) -> Result<Option<ModelRow>> {
        let row = self
            .stream
            .try_next()
            .await
            .map_err(|e| classify(self.dialect.as_ref(), e))?;
        Ok(row.map(ModelRow::new))
    }
}

impl std::fmt::Debug for ModelRows<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRows")
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}
