//! Error types for objectlog
//!
//! Every failure of the log protocol surfaces as a distinct variant so callers
//! can tell a lost append race from corruption or a backend outage.

use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Unified error type for log operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("malformed record: frame is {len} bytes, minimum is 10")]
    MalformedRecord { len: usize },

    #[error("offset mismatch: expected {expected}, frame carries {found}")]
    OffsetMismatch { expected: u64, found: u64 },

    #[error("checksum mismatch: stored 0x{stored:04X}, computed 0x{computed:04X}")]
    ChecksumMismatch { stored: u16, computed: u16 },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("no record at offset {offset}")]
    NotFound { offset: u64 },

    #[error("append conflict: offset {offset} was already written by another writer")]
    Conflict { offset: u64 },

    #[error("appending {payload_len} bytes at length {length} would exceed the size limit of {limit}")]
    SizeLimitExceeded {
        length: u64,
        payload_len: u64,
        limit: u64,
    },

    #[error("log is empty")]
    EmptyLog,

    #[error("malformed key: {key}")]
    MalformedKey { key: String },

    #[error("offset space exhausted")]
    OffsetExhausted,

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl LogError {
    /// True when a conditional create lost a race. The caller should learn the
    /// new tail before retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LogError::Conflict { .. })
    }

    /// True when a write may or may not have taken effect on the backend.
    ///
    /// Only a timed-out put qualifies. Timed-out reads and listings change
    /// nothing, and backend errors stay `StoreUnavailable`.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, LogError::Timeout { operation: "put", .. })
    }
}
