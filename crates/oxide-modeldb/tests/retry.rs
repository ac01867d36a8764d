//! Tests for the retrying transaction runner.
//!
//! A scripted in-memory source stands in for the database: inserts are
//! buffered per transaction and only become visible on a successful commit,
//! and commit or rollback outcomes can be forced to fail.

use std::collections::VecDeque;
use std::future::{Future, ready};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use oxide_modeldb::retry::{self, Transactional, TxBegin};
use oxide_modeldb::{Error, ErrorKind, IsolationLevel, Result};

#[derive(Debug, Clone, Copy)]
enum Failure {
    Conflict,
    Duplicate,
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Self::Conflict => Error::SerializationConflict {
                message: String::from("could not serialize access"),
            },
            Self::Duplicate => Error::DuplicateEntry {
                constraint: Some(String::from("entry_pkey")),
                message: String::from("duplicate key value"),
            },
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    committed: Mutex<Vec<String>>,
    commit_failures: Mutex<VecDeque<Failure>>,
    fail_rollback: AtomicBool,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl Store {
    fn committed(&self) -> Vec<String> {
        self.committed.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
struct MemorySource {
    store: Arc<Store>,
}

impl MemorySource {
    fn fail_commits(&self, failures: &[Failure]) {
        self.store
            .commit_failures
            .lock()
            .unwrap()
            .extend(failures.iter().copied());
    }
}

#[derive(Debug)]
struct MemoryTx {
    store: Arc<Store>,
    pending: Vec<String>,
    finalized: bool,
}

impl MemoryTx {
    fn insert(&mut self, entry: &str) {
        self.pending.push(entry.to_string());
    }
}

impl TxBegin for MemorySource {
    type Tx = MemoryTx;

    fn begin_tx(&self, _level: IsolationLevel) -> impl Future<Output = Result<MemoryTx>> + Send {
        self.store.begins.fetch_add(1, Ordering::SeqCst);
        ready(Ok(MemoryTx {
            store: Arc::clone(&self.store),
            pending: Vec::new(),
            finalized: false,
        }))
    }
}

impl Transactional for MemoryTx {
    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        let result = if self.finalized {
            Err(Error::TransactionFinalized)
        } else {
            self.finalized = true;
            self.store.commits.fetch_add(1, Ordering::SeqCst);
            let failure = self.store.commit_failures.lock().unwrap().pop_front();
            match failure {
                Some(failure) => Err(failure.into_error()),
                None => {
                    self.store
                        .committed
                        .lock()
                        .unwrap()
                        .extend(self.pending.drain(..));
                    Ok(())
                }
            }
        };
        ready(result)
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        let result = if self.finalized {
            Err(Error::TransactionFinalized)
        } else {
            self.finalized = true;
            self.pending.clear();
            self.store.rollbacks.fetch_add(1, Ordering::SeqCst);
            if self.store.fail_rollback.load(Ordering::SeqCst) {
                Err(Error::Database(sqlx::Error::PoolClosed))
            } else {
                Ok(())
            }
        };
        ready(result)
    }
}

// =============================================================================
// Test: Successful work
// =============================================================================

#[tokio::test]
async fn test_commits_once_on_success() {
    let source = MemorySource::default();
    let value = retry::run(&source, IsolationLevel::Serializable, |tx| {
        Box::pin(async move {
            tx.insert("a");
            Ok(7)
        })
    })
    .await
    .unwrap();

    assert_eq!(value, 7);
    assert_eq!(source.store.committed(), vec!["a"]);
    assert_eq!(source.store.begins.load(Ordering::SeqCst), 1);
    assert_eq!(source.store.commits.load(Ordering::SeqCst), 1);
    assert_eq!(source.store.rollbacks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_work_that_commits_itself_is_not_committed_again() {
    let source = MemorySource::default();
    retry::run(&source, IsolationLevel::Serializable, |tx| {
        Box::pin(async move {
            tx.insert("a");
            tx.commit().await
        })
    })
    .await
    .unwrap();

    assert_eq!(source.store.committed(), vec!["a"]);
    assert_eq!(source.store.commits.load(Ordering::SeqCst), 1);
    assert_eq!(source.store.rollbacks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_work_that_rolls_back_itself_succeeds() {
    let source = MemorySource::default();
    retry::run(&source, IsolationLevel::ReadCommitted, |tx| {
        Box::pin(async move {
            tx.insert("a");
            tx.rollback().await
        })
    })
    .await
    .unwrap();

    assert!(source.store.committed().is_empty());
    assert_eq!(source.store.commits.load(Ordering::SeqCst), 0);
    assert_eq!(source.store.rollbacks.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Test: Serialization conflicts
// =============================================================================

#[tokio::test]
async fn test_commit_conflict_reruns_work() {
    let source = MemorySource::default();
    source.fail_commits(&[Failure::Conflict]);
    let runs = Arc::new(AtomicUsize::new(0));

    retry::run(&source, IsolationLevel::Serializable, |tx| {
        let runs = Arc::clone(&runs);
        Box::pin(async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tx.insert("a");
            Ok(())
        })
    })
    .await
    .unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(source.store.begins.load(Ordering::SeqCst), 2);
    // The first attempt's insert was discarded with its transaction.
    assert_eq!(source.store.committed(), vec!["a"]);
}

#[tokio::test]
async fn test_conflict_from_work_is_rolled_back_and_retried() {
    let source = MemorySource::default();
    let runs = Arc::new(AtomicUsize::new(0));

    let attempt = retry::run(&source, IsolationLevel::Serializable, |tx| {
        let runs = Arc::clone(&runs);
        Box::pin(async move {
            let attempt = runs.fetch_add(1, Ordering::SeqCst) + 1;
            tx.insert(&format!("attempt-{attempt}"));
            if attempt < 3 {
                return Err(Failure::Conflict.into_error());
            }
            Ok(attempt)
        })
    })
    .await
    .unwrap();

    assert_eq!(attempt, 3);
    assert_eq!(source.store.committed(), vec!["attempt-3"]);
    assert_eq!(source.store.rollbacks.load(Ordering::SeqCst), 2);
    assert_eq!(source.store.commits.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Test: Other failures
// =============================================================================

#[tokio::test]
async fn test_other_work_error_is_returned_without_retry() {
    let source = MemorySource::default();
    let runs = Arc::new(AtomicUsize::new(0));

    let err = retry::run(&source, IsolationLevel::Serializable, |tx| {
        let runs = Arc::clone(&runs);
        Box::pin(async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tx.insert("a");
            Err::<(), _>(Failure::Duplicate.into_error())
        })
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateEntry);
    assert_eq!(err.constraint(), Some("entry_pkey"));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(source.store.rollbacks.load(Ordering::SeqCst), 1);
    assert!(source.store.committed().is_empty());
}

#[tokio::test]
async fn test_commit_error_is_returned_without_retry() {
    let source = MemorySource::default();
    source.fail_commits(&[Failure::Duplicate]);

    let err = retry::run(&source, IsolationLevel::Serializable, |tx| {
        Box::pin(async move {
            tx.insert("a");
            Ok(())
        })
    })
    .await
    .unwrap_err();

    assert!(err.is_duplicate_entry());
    assert_eq!(source.store.begins.load(Ordering::SeqCst), 1);
    // A failed commit finalizes the transaction; no rollback follows.
    assert_eq!(source.store.rollbacks.load(Ordering::SeqCst), 0);
    assert!(source.store.committed().is_empty());
}

#[tokio::test]
async fn test_rollback_failure_is_unrecoverable() {
    let source = MemorySource::default();
    source.store.fail_rollback.store(true, Ordering::SeqCst);

    let err = retry::run(&source, IsolationLevel::Serializable, |_tx| {
        Box::pin(async move { Err::<(), _>(Failure::Conflict.into_error()) })
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unrecoverable);
    match err {
        Error::RollbackFailed(inner) => assert!(matches!(*inner, Error::Database(_))),
        other => panic!("Expected RollbackFailed, got {other:?}"),
    }
    // The conflict is not retried once the rollback failed.
    assert_eq!(source.store.begins.load(Ordering::SeqCst), 1);
}
