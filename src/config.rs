//! Configuration for objectlog
//!
//! Centralized configuration with sensible defaults.
//!
//! A config can also be kept in a TOML file. Missing keys take their
//! defaults:
//!
//! ```toml
//! prefix = "orders"
//! size_limit = 1048576
//!
//! [store]
//! type = "Local"
//! path = "/var/lib/objectlog"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};

/// Default cumulative size budget (64 MB)
pub const DEFAULT_SIZE_LIMIT: u64 = 64 * 1024 * 1024;

/// Default number of keys per listing page
pub const DEFAULT_LIST_PAGE_SIZE: usize = 1000;

/// Main configuration for a log handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Namespace Configuration
    // -------------------------------------------------------------------------
    /// Key prefix of the log. Records live at `{prefix}/{offset:020}`.
    pub prefix: String,

    /// Backend holding the log's objects
    pub store: ObjectStoreConfig,

    // -------------------------------------------------------------------------
    // Append Configuration
    // -------------------------------------------------------------------------
    /// Size budget used by `append_default` and the CLI
    pub size_limit: u64,

    /// Retry policy used by `append_with_retry`
    pub retry: RetryPolicy,

    // -------------------------------------------------------------------------
    // Backend Call Configuration
    // -------------------------------------------------------------------------
    /// Deadline applied to every individual store call (None = no deadline)
    pub op_timeout: Option<Duration>,

    /// How recovery picks the tail key out of a listing
    pub tail_scan: TailScan,

    /// Keys per listing page
    pub list_page_size: usize,
}

/// Object store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectStoreConfig {
    /// Process-local store, lost on exit
    InMemory,

    /// Directory on the local filesystem
    Local { path: PathBuf },

    /// Amazon S3 (or an S3-compatible endpoint)
    Aws {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
}

/// Tail discovery strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailScan {
    /// Track the greatest key over every page of the listing.
    /// Correct regardless of the order pages arrive in.
    #[default]
    RunningMax,

    /// Take the last key of the last non-empty page.
    /// Only valid when the backend returns keys globally sorted across pages.
    TrustListingOrder,
}

/// Bounded retry for conflicting or indeterminate appends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,

    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: "wal".to_string(),
            store: ObjectStoreConfig::InMemory,
            size_limit: DEFAULT_SIZE_LIMIT,
            retry: RetryPolicy::default(),
            op_timeout: None,
            tail_scan: TailScan::default(),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LogError::Config(format!("invalid config: {}", e)))
    }

    /// Render the config as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| LogError::Config(format!("cannot render config: {}", e)))
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LogError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the key prefix of the log
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the object store backend
    pub fn store(mut self, store: ObjectStoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Set the default size limit (in bytes)
    pub fn size_limit(mut self, limit: u64) -> Self {
        self.config.size_limit = limit;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the per-call deadline
    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.config.op_timeout = Some(timeout);
        self
    }

    /// Set the tail discovery strategy
    pub fn tail_scan(mut self, scan: TailScan) -> Self {
        self.config.tail_scan = scan;
        self
    }

    /// Set the listing page size
    pub fn list_page_size(mut self, size: usize) -> Self {
        self.config.list_page_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
