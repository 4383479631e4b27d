//! `object_store` adapter
//!
//! Runs the log on any backend of the `object_store` crate: Amazon S3, the
//! local filesystem, or its own in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{ObjectStore as _, PutOptions, PutPayload};

use super::{ObjectStore, PutMode, StoreError, StoreResult};

/// Object store backed by an `object_store` implementation
#[derive(Debug)]
pub struct RemoteStore {
    inner: Arc<dyn object_store::ObjectStore>,
    page_size: usize,
}

impl RemoteStore {
    pub fn new(inner: Arc<dyn object_store::ObjectStore>, page_size: usize) -> Self {
        Self {
            inner,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl ObjectStore for RemoteStore {
    async fn put(&self, key: &str, body: Bytes, mode: PutMode) -> StoreResult<()> {
        let opts = PutOptions {
            mode: match mode {
                PutMode::Create => object_store::PutMode::Create,
                PutMode::Overwrite => object_store::PutMode::Overwrite,
            },
            ..Default::default()
        };

        match self
            .inner
            .put_opts(&Path::from(key), PutPayload::from(body), opts)
            .await
        {
            Ok(_) => Ok(()),
            // S3 reports a failed If-None-Match as a precondition failure
            Err(object_store::Error::AlreadyExists { .. })
            | Err(object_store::Error::Precondition { .. }) => {
                Err(StoreError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(StoreError::Backend(e)),
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let result = match self.inner.get(&Path::from(key)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StoreError::Backend(e)),
        };
        Ok(result.bytes().await?)
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, StoreResult<Vec<String>>> {
        let prefix = Path::from(prefix);
        self.inner
            .list(Some(&prefix))
            .map_ok(|meta| meta.location.to_string())
            .chunks(self.page_size)
            .map(|page| {
                page.into_iter()
                    .map(|key| key.map_err(StoreError::from))
                    .collect::<StoreResult<Vec<String>>>()
            })
            .boxed()
    }
}
