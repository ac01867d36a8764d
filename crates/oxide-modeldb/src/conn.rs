//! Statement execution shared by the pool and open transactions.
//!
//! Helpers written against [`ModelConn`] run unchanged on a [`ModelDb`] or
//! inside a [`ModelTx`]:
//!
//! ```rust,ignore
//! async fn rename<C: ModelConn>(conn: &mut C, id: i64, name: &str) -> Result<()> {
//!     conn.exec("UPDATE user SET name = ? WHERE id = ?", &[name.into(), id.into()])
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;

use oxide_modeldb_core::{Arg, Model};
use sqlx::any::AnyQueryResult;

use crate::db::ModelDb;
use crate::error::Result;
use crate::rows::{ModelRow, ModelRows};
use crate::tx::ModelTx;

/// A connection that runs statements with `?` placeholders.
pub trait ModelConn: Send {
    /// Executes a statement.
    fn exec(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<AnyQueryResult>> + Send;

    /// Runs a query and returns a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Returns a parse or mapping error for malformed statements and
    /// arguments.
    fn query(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRows<'_>>;

    /// Runs a query and returns its first row, or [`crate::Error::NotFound`].
    fn query_row(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<ModelRow>> + Send;

    /// Runs a query and materializes its first row as a record.
    fn query_one<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<M>> + Send;

    /// Runs a query and materializes every row as a record.
    fn query_all<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<Vec<M>>> + Send;
}

impl ModelConn for ModelDb {
    fn exec(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<AnyQueryResult>> + Send {
        Self::exec(self, statement, args)
    }

    fn query(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRows<'_>> {
        Self::query(self, statement, args)
    }

    fn query_row(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<ModelRow>> + Send {
        Self::query_row(self, statement, args)
    }

    fn query_one<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<M>> + Send {
        Self::query_one(self, statement, args)
    }

    fn query_all<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<Vec<M>>> + Send {
        Self::query_all(self, statement, args)
    }
}

impl ModelConn for ModelTx {
    fn exec(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<AnyQueryResult>> + Send {
        Self::exec(self, statement, args)
    }

    fn query(&mut self, statement: &str, args: &[Arg<'_>]) -> Result<ModelRows<'_>> {
        Self::query(self, statement, args)
    }

    fn query_row(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<ModelRow>> + Send {
        Self::query_row(self, statement, args)
    }

    fn query_one<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<M>> + Send {
        Self::query_one(self, statement, args)
    }

    fn query_all<M: Model>(
        &mut self,
        statement: &str,
        args: &[Arg<'_>],
    ) -> impl Future<Output = Result<Vec<M>>> + Send {
        Self::query_all(self, statement, args)
    }
}
