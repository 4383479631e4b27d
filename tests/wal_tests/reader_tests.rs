//! Tests for read
//!
//! These tests verify:
//! - Missing offsets report NotFound
//! - Short frames, foreign offsets and corrupted bytes are all rejected
//! - Checks run in order: length, offset, checksum

use std::time::Duration;

use bytes::Bytes;
use objectlog::record;
use objectlog::store::InMemoryStore;
use objectlog::{Config, LogError};

use crate::{append_records, key, second_handle, setup_log, setup_log_with, test_config, PREFIX};

// =============================================================================
// Basic Read Tests
// =============================================================================

#[tokio::test]
async fn test_read_missing_offset() {
    let (_store, log) = setup_log();

    assert!(matches!(log.read(1).await, Err(LogError::NotFound { offset: 1 })));
    assert!(matches!(log.read(0).await, Err(LogError::NotFound { offset: 0 })));
}

#[tokio::test]
async fn test_read_past_tail() {
    let (_store, mut log) = setup_log();
    append_records(&mut log, 3).await;

    assert!(matches!(log.read(4).await, Err(LogError::NotFound { offset: 4 })));
}

#[tokio::test]
async fn test_read_from_other_handle() {
    let (store, mut writer) = setup_log();
    let reader = second_handle(&store, test_config());

    writer.append(b"shared", 100).await.unwrap();

    let rec = reader.read(1).await.unwrap();
    assert_eq!(rec.payload.as_ref(), b"shared");
    assert_eq!(reader.length(), 0);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[tokio::test]
async fn test_read_short_frame() {
    let (store, log) = setup_log();
    store.insert_raw(key(1), Bytes::from_static(&[0, 0, 0, 0, 0]));

    assert!(matches!(
        log.read(1).await,
        Err(LogError::MalformedRecord { len: 5 })
    ));
}

#[tokio::test]
async fn test_read_offset_mismatch() {
    let (store, log) = setup_log();
    store.insert_raw(key(2), record::encode(5, b"misplaced"));

    match log.read(2).await {
        Err(LogError::OffsetMismatch { expected, found }) => {
            assert_eq!(expected, 2);
            assert_eq!(found, 5);
        }
        other => panic!("expected OffsetMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_read_corrupted_payload() {
    let (store, mut log) = setup_log();
    log.append(b"hello", 100).await.unwrap();

    let mut bytes = store.raw(&key(1)).unwrap().to_vec();
    bytes[9] ^= 0x01;
    store.insert_raw(key(1), bytes);

    assert!(matches!(
        log.read(1).await,
        Err(LogError::ChecksumMismatch { .. })
    ));
}

#[tokio::test]
async fn test_offset_checked_before_checksum() {
    let (store, log) = setup_log();
    let mut bytes = record::encode(9, b"wrong slot").to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    store.insert_raw(key(3), bytes);

    assert!(matches!(
        log.read(3).await,
        Err(LogError::OffsetMismatch { expected: 3, found: 9 })
    ));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_read_store_failure() {
    let (store, mut log) = setup_log();
    log.append(b"x", 100).await.unwrap();
    store.fail_next_get();

    assert!(matches!(log.read(1).await, Err(LogError::StoreUnavailable(_))));
    assert!(log.read(1).await.is_ok());
}

#[tokio::test]
async fn test_read_timeout() {
    let store = InMemoryStore::new().with_latency(Duration::from_millis(200));
    let config = Config::builder()
        .prefix(PREFIX)
        .op_timeout(Duration::from_millis(20))
        .build();
    let (store, log) = setup_log_with(store, config);
    store.insert_raw(key(1), record::encode(1, b"x"));

    let err = log.read(1).await.unwrap_err();
    assert!(matches!(err, LogError::Timeout { operation: "get", .. }));
    // Nothing was written, so there is nothing to reconcile
    assert!(!err.is_indeterminate());
}
