//! In-memory object store
//!
//! A deterministic store for tests and local experiments. Besides the plain
//! put/get/list behaviour it can:
//! - emit listing pages out of global order
//! - delay every put/get by a fixed latency
//! - fail the next call of a given kind
//! - record every call it receives

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

use super::{ObjectStore, PutMode, StoreError, StoreResult};
use crate::config::DEFAULT_LIST_PAGE_SIZE;

/// Order in which listing pages are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingOrder {
    /// Pages in key order; the whole listing is globally sorted
    #[default]
    Sorted,

    /// Each page sorted, pages emitted last-first
    PagesReversed,
}

/// Recorded call to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put { key: String, mode: PutMode },
    Get { key: String },
    List { prefix: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Put,
    Get,
    List,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, Bytes>,
    calls: Vec<StoreCall>,
    pending_faults: Vec<Operation>,
}

impl Inner {
    fn take_fault(&mut self, op: Operation) -> bool {
        match self.pending_faults.iter().position(|&f| f == op) {
            Some(idx) => {
                self.pending_faults.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Object store backed by a `BTreeMap`
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    page_size: usize,
    listing_order: ListingOrder,
    latency: Option<Duration>,
}

impl InMemoryStore {
    /// Create an empty store with sorted listings
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            page_size: DEFAULT_LIST_PAGE_SIZE,
            listing_order: ListingOrder::Sorted,
            latency: None,
        }
    }

    /// Set the number of keys per listing page (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the order listing pages are emitted in
    pub fn with_listing_order(mut self, order: ListingOrder) -> Self {
        self.listing_order = order;
        self
    }

    /// Delay every put and get by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    // =========================================================================
    // Fault Injection
    // =========================================================================

    /// Make the next put fail with `StoreError::Unavailable`
    pub fn fail_next_put(&self) {
        self.inner.lock().pending_faults.push(Operation::Put);
    }

    /// Make the next get fail with `StoreError::Unavailable`
    pub fn fail_next_get(&self) {
        self.inner.lock().pending_faults.push(Operation::Get);
    }

    /// Make the next listing fail on its first page
    pub fn fail_next_list(&self) {
        self.inner.lock().pending_faults.push(Operation::List);
    }

    // =========================================================================
    // Inspection (for tests and debugging)
    // =========================================================================

    /// All calls received so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// All stored keys in order
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().objects.keys().cloned().collect()
    }

    /// Raw object bytes, bypassing call recording
    pub fn raw(&self, key: &str) -> Option<Bytes> {
        self.inner.lock().objects.get(key).cloned()
    }

    /// Store raw bytes, bypassing call recording and conditional checks
    pub fn insert_raw(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.inner.lock().objects.insert(key.into(), body.into());
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn put(&self, key: &str, body: Bytes, mode: PutMode) -> StoreResult<()> {
        self.inner.lock().calls.push(StoreCall::Put {
            key: key.to_string(),
            mode,
        });
        self.delay().await;

        let mut inner = self.inner.lock();
        if inner.take_fault(Operation::Put) {
            return Err(StoreError::Unavailable(format!("injected put failure for {}", key)));
        }
        if mode == PutMode::Create && inner.objects.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        inner.objects.insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.inner.lock().calls.push(StoreCall::Get {
            key: key.to_string(),
        });
        self.delay().await;

        let mut inner = self.inner.lock();
        if inner.take_fault(Operation::Get) {
            return Err(StoreError::Unavailable(format!("injected get failure for {}", key)));
        }
        inner
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, StoreResult<Vec<String>>> {
        let mut inner = self.inner.lock();
        inner.calls.push(StoreCall::List {
            prefix: prefix.to_string(),
        });

        if inner.take_fault(Operation::List) {
            let err = StoreError::Unavailable(format!("injected list failure for {}", prefix));
            return stream::iter(vec![Err(err)]).boxed();
        }

        let keys: Vec<String> = inner
            .objects
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        drop(inner);

        let mut pages: Vec<Vec<String>> = keys
            .chunks(self.page_size)
            .map(<[String]>::to_vec)
            .collect();
        if self.listing_order == ListingOrder::PagesReversed {
            pages.reverse();
        }

        stream::iter(pages.into_iter().map(Ok)).boxed()
    }
}
