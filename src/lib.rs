//! # objectlog
//!
//! A durable, append-only log on top of object storage with:
//! - Monotonic 1-based offsets, one object per record
//! - At-most-once writes per offset via conditional create
//! - CRC16-checked records, validated on every read
//! - Tail recovery by listing, no external coordinator
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        LogHandle                             │
//! │        append  ·  read  ·  last_record  ·  retry             │
//! └──────────┬──────────────────┬──────────────────┬────────────┘
//!            │                  │                  │
//!            ▼                  ▼                  ▼
//!     ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!     │  KeyCodec   │    │   Record    │    │ ObjectStore │
//!     │ offset<->key│    │ frame+CRC16 │    │ put/get/list│
//!     └─────────────┘    └─────────────┘    └──────┬──────┘
//!                                                  │
//!                                  ┌───────────────┴──────────────┐
//!                                  ▼                              ▼
//!                           ┌─────────────┐               ┌──────────────┐
//!                           │  InMemory   │               │ object_store │
//!                           │   (tests)   │               │ S3 / local fs│
//!                           └─────────────┘               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod checksum;
pub mod key;
pub mod record;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogError, Result};
pub use config::Config;
pub use record::Record;
pub use wal::LogHandle;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of objectlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
