//! Store factory
//!
//! Builds the configured backend.

use std::sync::Arc;

use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::local::LocalFileSystem;

use super::{InMemoryStore, ObjectStore, RemoteStore};
use crate::config::{Config, ObjectStoreConfig};
use crate::error::{LogError, Result};

/// Create the object store described by `config.store`
pub fn create_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    match &config.store {
        ObjectStoreConfig::InMemory => Ok(Arc::new(
            InMemoryStore::new().with_page_size(config.list_page_size),
        )),
        ObjectStoreConfig::Local { path } => {
            std::fs::create_dir_all(path).map_err(|e| {
                LogError::Config(format!("failed to create {}: {}", path.display(), e))
            })?;
            let fs = LocalFileSystem::new_with_prefix(path).map_err(|e| {
                LogError::Config(format!("failed to open local store at {}: {}", path.display(), e))
            })?;
            Ok(Arc::new(RemoteStore::new(Arc::new(fs), config.list_page_size)))
        }
        ObjectStoreConfig::Aws {
            bucket,
            region,
            endpoint,
        } => {
            // Conditional puts are what make appends race-safe
            let mut builder = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_region(region)
                .with_conditional_put(S3ConditionalPut::ETagMatch);
            if let Some(endpoint) = endpoint {
                builder = builder.with_endpoint(endpoint).with_allow_http(true);
            }
            let s3 = builder.build().map_err(|e| {
                LogError::Config(format!("failed to create S3 store for bucket {}: {}", bucket, e))
            })?;
            Ok(Arc::new(RemoteStore::new(Arc::new(s3), config.list_page_size)))
        }
    }
}
