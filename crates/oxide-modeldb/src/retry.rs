//! Transactions retried on serialization conflicts.
//!
//! [`run`] begins a transaction, runs a unit of work inside it and commits.
//! When the work or the commit reports a serialization conflict, the
//! transaction is rolled back and the whole unit runs again from a fresh
//! transaction. There is no retry limit and no backoff, so work units
//! should be short and safe to repeat.
//!
//! ```rust,ignore
//! let id = db
//!     .do_begin_serializable(|tx| {
//!         Box::pin(async move {
//!             tx.exec("UPDATE account SET balance = balance - ? WHERE id = ?", &[10.into(), 1.into()])
//!                 .await?;
//!             tx.exec("UPDATE account SET balance = balance + ? WHERE id = ?", &[10.into(), 2.into()])
//!                 .await?;
//!             Ok(())
//!         })
//!     })
//!     .await?;
//! ```

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{error, warn};

use crate::dialect::IsolationLevel;
use crate::error::{Error, Result};

/// Something that can begin a transaction.
pub trait TxBegin {
    /// The transaction handle.
    type Tx: Transactional;

    /// Begins a transaction at `level`.
    fn begin_tx(&self, level: IsolationLevel) -> impl Future<Output = Result<Self::Tx>> + Send;
}

/// An open or finalized transaction.
pub trait Transactional: Send {
    /// Returns true once the transaction was committed or rolled back.
    fn is_finalized(&self) -> bool;

    /// Commits the transaction. It is finalized even if the commit fails.
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Rolls the transaction back. It is finalized even if the rollback
    /// fails.
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Runs `work` in a transaction, retrying on serialization conflicts.
///
/// After `work` returns successfully the transaction is committed, unless
/// `work` already finalized it. A transaction left open on any other path
/// is rolled back before the outcome is inspected.
///
/// # Errors
///
/// Returns the first error that is not a serialization conflict: from
/// beginning the transaction, from `work`, or from the commit. If the
/// implicit rollback fails, [`Error::RollbackFailed`] is returned instead
/// of the outcome of `work`.
pub async fn run<S, T, F>(source: &S, level: IsolationLevel, mut work: F) -> Result<T>
where
    S: TxBegin + Sync,
    F: for<'t> FnMut(&'t mut S::Tx) -> BoxFuture<'t, Result<T>>,
{
    let mut tries = 0_u32;
    loop {
        let mut tx = source.begin_tx(level).await?;

        let outcome = match work(&mut tx).await {
            Ok(value) if tx.is_finalized() => Ok(value),
            Ok(value) => tx.commit().await.map(|()| value),
            Err(err) => Err(err),
        };

        if !tx.is_finalized() {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Rollback of failed transaction failed");
                return Err(Error::RollbackFailed(Box::new(rollback_err)));
            }
        }

        match outcome {
            Err(err) if err.is_serialization_conflict() => {
                tries += 1;
                warn!(tries, isolation = %level, "Retrying serializable transaction");
            }
            other => return other,
        }
    }
}
