//! Tests for append_with_retry
//!
//! These tests verify:
//! - A lost race is retried at the refreshed tail
//! - Attempts are bounded
//! - Non-retryable errors pass straight through
//! - Timed-out appends are reconciled by reading, never blindly repeated
//! - A late commit of a timed-out append is not written a second time

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use objectlog::config::RetryPolicy;
use objectlog::store::{InMemoryStore, ObjectStore, PutMode, StoreCall, StoreResult};
use objectlog::{Config, LogError, LogHandle};

use crate::{append_records, key, second_handle, setup_log, test_config, PREFIX};

// =============================================================================
// Helper Store
// =============================================================================

/// What the first put does before behaving normally
enum FirstPut {
    /// Write the object, then never acknowledge
    CommitThenHang,
    /// Hang without writing anything
    HangBeforeCommit,
    /// Hang, while a detached task writes the object after a delay
    CommitLater(Duration),
}

/// Wraps an InMemoryStore and misbehaves on the first put
struct FlakyStore {
    inner: Arc<InMemoryStore>,
    first_put: Mutex<Option<FirstPut>>,
}

impl FlakyStore {
    fn new(inner: Arc<InMemoryStore>, first_put: FirstPut) -> Self {
        Self {
            inner,
            first_put: Mutex::new(Some(first_put)),
        }
    }
}

const HANG: Duration = Duration::from_secs(5);

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, key: &str, body: Bytes, mode: PutMode) -> StoreResult<()> {
        let behaviour = self.first_put.lock().unwrap().take();
        match behaviour {
            Some(FirstPut::CommitThenHang) => {
                self.inner.put(key, body, mode).await?;
                tokio::time::sleep(HANG).await;
                Ok(())
            }
            Some(FirstPut::HangBeforeCommit) => {
                tokio::time::sleep(HANG).await;
                self.inner.put(key, body, mode).await
            }
            Some(FirstPut::CommitLater(delay)) => {
                let inner = self.inner.clone();
                let key = key.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = inner.put(&key, body, mode).await;
                });
                tokio::time::sleep(HANG).await;
                Ok(())
            }
            None => self.inner.put(key, body, mode).await,
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.inner.get(key).await
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, StoreResult<Vec<String>>> {
        self.inner.list(prefix)
    }
}

fn flaky_log(first_put: FirstPut) -> (Arc<InMemoryStore>, LogHandle) {
    flaky_log_with_backoff(first_put, Duration::from_millis(1))
}

fn flaky_log_with_backoff(
    first_put: FirstPut,
    backoff: Duration,
) -> (Arc<InMemoryStore>, LogHandle) {
    let inner = Arc::new(InMemoryStore::new());
    let store = Arc::new(FlakyStore::new(inner.clone(), first_put));
    let config = Config::builder()
        .prefix(PREFIX)
        .op_timeout(Duration::from_millis(50))
        .retry(RetryPolicy {
            max_attempts: 3,
            backoff,
        })
        .build();
    let log = LogHandle::with_store(config, store).unwrap();
    (inner, log)
}

fn put_count(store: &InMemoryStore) -> usize {
    store
        .calls()
        .iter()
        .filter(|call| matches!(call, StoreCall::Put { .. }))
        .count()
}

// =============================================================================
// Conflict Retry Tests
// =============================================================================

#[tokio::test]
async fn test_retry_after_conflict() {
    let (store, mut early) = setup_log();
    let mut late = second_handle(&store, test_config());

    append_records(&mut early, 2).await;

    let offset = late.append_with_retry(b"late", 1000).await.unwrap();

    assert_eq!(offset, 3);
    assert_eq!(late.length(), 3);
    assert_eq!(late.read(3).await.unwrap().payload.as_ref(), b"late");
    assert_eq!(store.object_count(), 3);
}

#[tokio::test]
async fn test_retry_without_conflict_is_plain_append() {
    let (store, mut log) = setup_log();

    assert_eq!(log.append_with_retry(b"only", 1000).await.unwrap(), 1);
    assert_eq!(put_count(&store), 1);
}

#[tokio::test]
async fn test_retry_attempts_are_bounded() {
    let config = Config::builder()
        .prefix(PREFIX)
        .retry(RetryPolicy {
            max_attempts: 1,
            backoff: Duration::from_millis(1),
        })
        .build();
    let (store, mut early) = setup_log();
    let mut late = second_handle(&store, config);

    early.append(b"first", 1000).await.unwrap();

    assert!(matches!(
        late.append_with_retry(b"late", 1000).await,
        Err(LogError::Conflict { offset: 1 })
    ));
    assert_eq!(late.length(), 0);
}

#[tokio::test]
async fn test_retry_passes_through_size_limit() {
    let (store, mut log) = setup_log();

    assert!(matches!(
        log.append_with_retry(b"too big", 3).await,
        Err(LogError::SizeLimitExceeded { .. })
    ));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_retry_passes_through_store_failure() {
    let (store, mut log) = setup_log();
    store.fail_next_put();

    assert!(matches!(
        log.append_with_retry(b"x", 100).await,
        Err(LogError::StoreUnavailable(_))
    ));
    assert_eq!(put_count(&store), 1);
}

// =============================================================================
// Indeterminate Outcome Tests
// =============================================================================

#[tokio::test]
async fn test_timed_out_append_that_committed() {
    let (inner, mut log) = flaky_log(FirstPut::CommitThenHang);

    let offset = log.append_with_retry(b"mine", 1000).await.unwrap();

    assert_eq!(offset, 1);
    assert_eq!(log.length(), 1);
    assert_eq!(inner.object_count(), 1);
    // Reconciled by reading, not by writing again
    assert_eq!(put_count(&inner), 1);
}

#[tokio::test]
async fn test_timed_out_append_that_never_landed() {
    let (inner, mut log) = flaky_log(FirstPut::HangBeforeCommit);

    let offset = log.append_with_retry(b"mine", 1000).await.unwrap();

    assert_eq!(offset, 1);
    assert_eq!(inner.keys(), vec![key(1)]);
    assert_eq!(log.read(1).await.unwrap().payload.as_ref(), b"mine");
}

#[tokio::test]
async fn test_timed_out_append_taken_by_other_writer() {
    let (inner, mut log) = flaky_log(FirstPut::HangBeforeCommit);
    inner.insert_raw(key(1), objectlog::record::encode(1, b"theirs"));

    let offset = log.append_with_retry(b"mine", 1000).await.unwrap();

    assert_eq!(offset, 2);
    assert_eq!(log.read(1).await.unwrap().payload.as_ref(), b"theirs");
    assert_eq!(log.read(2).await.unwrap().payload.as_ref(), b"mine");
}

#[tokio::test]
async fn test_timed_out_append_that_committed_after_reconcile() {
    // The put lands at 100ms: after the 50ms deadline and the read that
    // followed it, but before the retry at 250ms.
    let (inner, mut log) = flaky_log_with_backoff(
        FirstPut::CommitLater(Duration::from_millis(100)),
        Duration::from_millis(200),
    );

    let offset = log.append_with_retry(b"mine", 1000).await.unwrap();

    assert_eq!(offset, 1);
    assert_eq!(log.length(), 1);
    assert_eq!(inner.keys(), vec![key(1)]);
    assert_eq!(log.read(1).await.unwrap().payload.as_ref(), b"mine");
}

#[tokio::test]
async fn test_plain_append_reports_timeout() {
    let (inner, mut log) = flaky_log(FirstPut::CommitThenHang);

    let err = log.append(b"mine", 1000).await.unwrap_err();

    assert!(err.is_indeterminate());
    assert_eq!(log.length(), 0);
    // The write landed even though the caller saw a timeout
    assert_eq!(inner.object_count(), 1);
}
