//! Pooled database handle.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use oxide_modeldb_core::{Arg, Model};
use sqlx::AnyPool;
use sqlx::any::{AnyPoolOptions, AnyQueryResult};
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::dialect::{self, Dialect, IsolationLevel};
use crate::error::{Result, classify};
use crate::query;
use crate::retry::{self, TxBegin};
use crate::rows::{ModelRow, ModelRows};
use crate::tx::ModelTx;

/// A connection pool plus the dialect of its backend.
///
/// Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct ModelDb {
    pool: AnyPool,
    dialect: Arc<dyn Dialect>,
}

impl ModelDb {
    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedBackend`] if the URL scheme has no
    /// dialect, or the classified backend error if connecting fails.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let dialect = dialect::for_url(&config.url)?;
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| classify(dialect.as_ref(), e))?;

        info!(
            backend = dialect.name(),
            max_connections = config.max_connections,
            "Connected to database"
        );
        Ok(Self { pool, dialect })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: AnyPool, dialect: Arc<dyn Dialect>) -> Self {
        Self { pool, dialect }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Returns the backend dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Executes a statement.
    ///
    /// # Errors
    ///
    /// Returns the classified backend error, or a parse or mapping error for
    /// malformed statements and arguments.
    pub async fn exec(&self, statement: &str, args: &[Arg<'_>]) -> Result<AnyQueryResult> {
        query::execute(&self.pool, self.dialect.as_ref(), statement, args).await
    }

    /// Runs a query and returns a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Returns a parse or mapping error for malformed statements and
    /// arguments. Backend errors surface from [`ModelRows::next`].
    pub fn query(&self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRows<'_>> {
        query::fetch(&self.pool, Arc::clone(&self.dialect), statement, args)
    }

    /// Runs a query and returns its first row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if there are no rows; see also
    /// [`ModelDb::exec`].
    pub async fn query_row(&self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRow> {
        query::fetch_row(&self.pool, self.dialect.as_ref(), statement, args).await
    }

    /// Runs a query and materializes its first row as a record.
    ///
    /// # Errors
    ///
    /// See [`ModelDb::query_row`].
    pub async fn query_one<M: Model>(&self, statement: &str, args: &[Arg<'_>]) -> Result<M> {
        query::fetch_one(&self.pool, self.dialect.as_ref(), statement, args).await
    }

    /// Runs a query and materializes every row as a record.
    ///
    /// # Errors
    ///
    /// See [`ModelDb::exec`]. Rows read before a failure are discarded.
    pub async fn query_all<M: Model>(&self, statement: &str, args: &[Arg<'_>]) -> Result<Vec<M>> {
        query::fetch_all(&self.pool, self.dialect.as_ref(), statement, args).await
    }

    /// Begins a transaction at `level`.
    ///
    /// # Errors
    ///
    /// Returns the classified backend error if the transaction cannot be
    /// started or its isolation level cannot be set.
    pub async fn begin(&self, level: IsolationLevel) -> Result<ModelTx> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify(self.dialect.as_ref(), e))?;

        if let Some(sql) = self.dialect.isolation_statement(level) {
            debug!(sql = %sql, "Executing SQL");
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(self.dialect.as_ref(), e))?;
        }

        Ok(ModelTx::new(tx, Arc::clone(&self.dialect)))
    }

    /// Runs `work` in a transaction at `level`, retrying on serialization
    /// conflicts. See [`retry::run`].
    ///
    /// # Errors
    ///
    /// Returns the first error that is not a serialization conflict.
    pub async fn do_begin<T, F>(&self, level: IsolationLevel, work: F) -> Result<T>
    where
        F: for<'t> FnMut(&'t mut ModelTx) -> BoxFuture<'t, Result<T>>,
    {
        retry::run(self, level, work).await
    }

    /// Runs `work` in a serializable transaction, retrying on serialization
    /// conflicts.
    ///
    /// # Errors
    ///
    /// See [`ModelDb::do_begin`].
    pub async fn do_begin_serializable<T, F>(&self, work: F) -> Result<T>
    where
        F: for<'t> FnMut(&'t mut ModelTx) -> BoxFuture<'t, Result<T>>,
    {
        self.do_begin(IsolationLevel::Serializable, work).await
    }
}

impl TxBegin for ModelDb {
    type Tx = ModelTx;

    fn begin_tx(&self, level: IsolationLevel) -> impl Future<Output = Result<ModelTx>> + Send {
        self.begin(level)
    }
}
