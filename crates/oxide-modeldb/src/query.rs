//! Statement execution shared by [`crate::ModelDb`] and [`crate::ModelTx`].
//!
//! Every function translates the statement's placeholders, expands record
//! arguments, binds the values and runs the query against any sqlx executor:
//! the pool or an open transaction.

use std::sync::Arc;

use futures::TryStreamExt;
use oxide_modeldb_core::{Arg, Dest, Model, Registry, SqlValue, expand_args, translate_cached};
use sqlx::any::{Any, AnyArguments, AnyQueryResult};
use sqlx::query::Query;
use sqlx::Executor;
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Error, Result, classify};
use crate::rows::{ModelRow, ModelRows};

type AnyQuery = Query<'static, Any, AnyArguments<'static>>;

/// Translates, expands and binds a statement.
fn prepare(statement: &str, args: &[Arg<'_>]) -> Result<AnyQuery> {
    let sql = translate_cached(statement)?;
    let values = expand_args(Registry::global(), args)?;
    debug!(sql = %sql, params = values.len(), "Executing SQL");
    Ok(values.into_iter().fold(sqlx::query(sql), bind_param))
}

/// Binds a SqlValue parameter to a query.
fn bind_param(query: AnyQuery, value: SqlValue) -> AnyQuery {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

pub(crate) async fn execute<'c, E>(
    executor: E,
    dialect: &dyn Dialect,
    statement: &str,
    args: &[Arg<'_>],
) -> Result<AnyQueryResult>
where
    E: Executor<'c, Database = Any>,
{
    prepare(statement, args)?
        .execute(executor)
        .await
        .map_err(|e| classify(dialect, e))
}

pub(crate) fn fetch<'e, 'c: 'e, E>(
    executor: E,
    dialect: Arc<dyn Dialect>,
    statement: &str,
    args: &[Arg<'_>],
) -> Result<ModelRows<'e>>
where
    E: 'e + Executor<'c, Database = Any>,
{
    let stream = prepare(statement, args)?.fetch(executor);
    Ok(ModelRows::new(stream, dialect))
}

pub(crate) async fn fetch_row<'c, E>(
    executor: E,
    dialect: &dyn Dialect,
    statement: &str,
    args: &[Arg<'_>],
) -> Result<ModelRow>
where
    E: Executor<'c, Database = Any>,
{
    prepare(statement, args)?
        .fetch_optional(executor)
        .await
        .map_err(|e| classify(dialect, e))?
        .map(ModelRow::new)
        .ok_or(Error::NotFound)
}

pub(crate) async fn fetch_one<'c, M, E>(
    executor: E,
    dialect: &dyn Dialect,
    statement: &str,
    args: &[Arg<'_>],
) -> Result<M>
where
    M: Model,
    E: Executor<'c, Database = Any>,
{
    let row = fetch_row(executor, dialect, statement, args).await?;
    let mut record = M::default();
    row.scan(&mut [Dest::record(&mut record)])?;
    Ok(record)
}

pub(crate) async fn fetch_all<'c, M, E>(
    executor: E,
    dialect: &dyn Dialect,
    statement: &str,
    args: &[Arg<'_>],
) -> Result<Vec<M>>
where
    M: Model,
    E: Executor<'c, Database = Any>,
{
    let mut stream = prepare(statement, args)?.fetch(executor);
    let mut records = Vec::new();
    while let Some(row) = stream.try_next().await.map_err(|e| classify(dialect, e))? {
        let row = ModelRow::new(row);
        let mut record = M::default();
        row.scan(&mut [Dest::record(&mut record)])?;
        records.push(record);
    }
    Ok(records)
}
