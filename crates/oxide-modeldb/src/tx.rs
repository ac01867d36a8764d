//! Transaction handle.

use std::future::Future;
use std::sync::Arc;

use oxide_modeldb_core::{Arg, Model};
use sqlx::any::{Any, AnyQueryResult};
use sqlx::Transaction;
use tracing::warn;

use crate::dialect::Dialect;
use crate::error::{Error, Result, classify};
use crate::query;
use crate::retry::Transactional;
use crate::rows::{ModelRow, ModelRows};

/// An open database transaction.
///
/// Statements run on the transaction's connection. [`ModelTx::commit`] and
/// [`ModelTx::rollback`] finalize the handle; afterwards every operation
/// fails with [`Error::TransactionFinalized`]. A handle dropped while still
/// open is rolled back by the driver.
pub struct ModelTx {
    tx: Option<Transaction<'static, Any>>,
    dialect: Arc<dyn Dialect>,
}

impl ModelTx {
    pub(crate) fn new(tx: Transaction<'static, Any>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            tx: Some(tx),
            dialect,
        }
    }

    /// Returns true once the transaction was committed or rolled back.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.tx.is_none()
    }

    /// Executes a statement.
    ///
    /// # Errors
    ///
    /// Returns the classified backend error, or a parse or mapping error for
    /// malformed statements and arguments.
    pub async fn exec(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<AnyQueryResult> {
        let conn = self.tx.as_deref_mut().ok_or(Error::TransactionFinalized)?;
        query::execute(conn, self.dialect.as_ref(), statement, args).await
    }

    /// Runs a query and returns a cursor over its rows.
    ///
    /// # Errors
    ///
    /// See [`ModelTx::exec`].
    pub fn query(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRows<'_>> {
        let conn = self.tx.as_deref_mut().ok_or(Error::TransactionFinalized)?;
        query::fetch(conn, Arc::clone(&self.dialect), statement, args)
    }

    /// Runs a query and returns its first row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there are no rows; see also
    /// [`ModelTx::exec`].
    pub async fn query_row(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRow> {
        let conn = self.tx.as_deref_mut().ok_or(Error::TransactionFinalized)?;
        query::fetch_row(conn, self.dialect.as_ref(), statement, args).await
    }

    /// Runs a query and materializes its first row as a record.
    ///
    /// # Errors
    ///
    /// See [`ModelTx::query_row`].
    pub async fn query_one<M: Model>(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<M> {
        let conn = self.tx.as_deref_mut().ok_or(Error::TransactionFinalized)?;
        query::fetch_one(conn, self.dialect.as_ref(), statement, args).await
    }

    /// Runs a query and materializes every row as a record.
    ///
    /// # Errors
    ///
    /// See [`ModelTx::exec`]. Rows read before a failure are discarded.
    pub async fn query_all<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> Result<Vec<M>> {
        let conn = self.tx.as_deref_mut().ok_or(Error::TransactionFinalized)?;
        query::fetch_all(conn, self.dialect.as_ref(), statement, args).await
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionFinalized`] if already finalized, or the
    /// classified backend error. The handle is finalized either way.
    pub async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(Error::TransactionFinalized)?;
        tx.commit().await.map_err(|e| classify(self.dialect.as_ref(), e))
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// See [`ModelTx::commit`].
    pub async fn rollback(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(Error::TransactionFinalized)?;
        tx.rollback()
            .await
            .map_err(|e| classify(self.dialect.as_ref(), e))
    }

    /// Rolls the transaction back unless it was already finalized.
    ///
    /// # Errors
    ///
    /// Returns the classified backend error if the rollback fails.
    pub async fn finalize(&mut self) -> Result<()> {
        if self.is_finalized() {
            return Ok(());
        }
        self.rollback().await
    }
}

impl Transactional for ModelTx {
    fn is_finalized(&self) -> bool {
        Self::is_finalized(self)
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        Self::commit(self)
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        Self::rollback(self)
    }
}

impl Drop for ModelTx {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                backend = self.dialect.name(),
                "Transaction dropped without commit or rollback, rolling back"
            );
        }
    }
}

impl std::fmt::Debug for ModelTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelTx")
            .field("backend", &self.dialect.name())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
