//! Object Store Module
//!
//! The storage capability the log protocol is written against.
//!
//! ## Responsibilities
//! - Put an object, optionally only if the key is absent (conditional create)
//! - Get an object by key
//! - List keys under a prefix, page by page
//!
//! ## Listing Order
//! Pages are expected to be sorted internally. Whether the concatenation of
//! all pages is globally sorted depends on the backend, so recovery does not
//! assume it unless configured to (see [`TailScan`](crate::config::TailScan)).

mod factory;
pub mod memory;
mod remote;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

pub use factory::create_store;
pub use memory::{InMemoryStore, ListingOrder, StoreCall};
pub use remote::RemoteStore;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// How a put treats an existing object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Fail with [`StoreError::AlreadyExists`] if the key exists
    Create,

    /// Replace any existing object
    Overwrite,
}

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("object store error: {0}")]
    Backend(#[from] object_store::Error),
}

/// Storage backend consumed by the log
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Store `body` at `key`
    async fn put(&self, key: &str, body: Bytes, mode: PutMode) -> StoreResult<()>;

    /// Fetch the object at `key`
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// List the keys under `prefix`, one page per stream item
    ///
    /// `prefix` ends with `/`; only keys inside that namespace are returned.
    fn list<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, StoreResult<Vec<String>>>;
}
