//! Write-Ahead Log (WAL) Module
//!
//! The log protocol on top of an [`ObjectStore`]: one object per record,
//! offsets assigned by conditional create, tail found by listing.
//!
//! ## Responsibilities
//! - Append records at `length + 1` with at-most-once semantics per offset
//! - Validate every record on read (length, offset, CRC16)
//! - Rediscover the tail after a restart
//!
//! ## Object Layout
//! ```text
//! {prefix}/00000000000000000001  ──►  [offset][payload][crc16]
//! {prefix}/00000000000000000002  ──►  [offset][payload][crc16]
//! ...
//! ```
//!
//! ## Concurrency
//! A [`LogHandle`] drives one append stream; mutation needs `&mut self`.
//! Independent handles may target the same prefix, and the store's
//! conditional create decides which writer gets an offset.

mod reader;
mod recovery;
mod retry;
mod writer;

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::{LogError, Result};
use crate::key::KeyCodec;
use crate::store::{create_store, ObjectStore, StoreResult};

/// Process-local handle on a log
///
/// `length` is a cache of the highest offset this handle believes durable.
/// It is never persisted; [`LogHandle::last_record`] recomputes it from the
/// store.
pub struct LogHandle {
    /// Backend holding the records
    store: Arc<dyn ObjectStore>,

    /// Offset <-> key mapping for this prefix
    keys: KeyCodec,

    /// Handle configuration
    config: Config,

    /// Highest offset known to be written (0 = empty or unknown)
    length: u64,
}

impl LogHandle {
    /// Open the log described by `config`
    ///
    /// Builds the store and runs recovery, so `length` reflects the durable
    /// tail. An empty namespace yields `length == 0`.
    pub async fn open(config: Config) -> Result<Self> {
        let store = create_store(&config)?;
        let mut handle = Self::with_store(config, store)?;

        match handle.last_record().await {
            Ok(tail) => info!("Opened log {:?} at offset {}", handle.prefix(), tail.offset),
            Err(LogError::EmptyLog) => info!("Opened empty log {:?}", handle.prefix()),
            Err(e) => return Err(e),
        }

        Ok(handle)
    }

    /// Create a handle over an existing store without touching it
    ///
    /// `length` starts at 0; call [`LogHandle::last_record`] before appending
    /// to a log that may already hold records.
    pub fn with_store(config: Config, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let keys = KeyCodec::new(&config.prefix)?;
        Ok(Self {
            store,
            keys,
            config,
            length: 0,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Highest offset this handle believes durable
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Key prefix of the log
    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// Object key of the record at `offset`
    pub fn key_for(&self, offset: u64) -> String {
        self.keys.encode(offset)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a store call under the configured deadline
    ///
    /// The outer result carries the timeout, the inner one the store outcome,
    /// so each protocol can map store errors its own way.
    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<StoreResult<T>> {
        match self.config.op_timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| LogError::Timeout { operation, after }),
            None => Ok(call.await),
        }
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("prefix", &self.prefix())
            .field("length", &self.length)
            .finish()
    }
}
