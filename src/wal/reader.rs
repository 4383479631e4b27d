//! WAL Reader
//!
//! Fetches a record by offset and validates it before handing it out.

use tracing::{debug, warn};

use super::LogHandle;
use crate::error::{LogError, Result};
use crate::record::{self, Record};
use crate::store::StoreError;

impl LogHandle {
    /// Read the record at `offset`
    ///
    /// Checks, in order: the frame is long enough, the embedded offset matches
    /// the requested one, and the checksum holds. Nothing is returned unless
    /// all three pass.
    pub async fn read(&self, offset: u64) -> Result<Record> {
        let key = self.keys.encode(offset);

        let frame = match self.with_deadline("get", self.store.get(&key)).await? {
            Ok(frame) => frame,
            Err(StoreError::NotFound(_)) => return Err(LogError::NotFound { offset }),
            Err(e) => return Err(LogError::StoreUnavailable(e)),
        };

        let found = record::embedded_offset(&frame)?;
        if found != offset {
            warn!("Record at {} carries offset {}", key, found);
            return Err(LogError::OffsetMismatch {
                expected: offset,
                found,
            });
        }

        let record = record::parse(frame).map_err(|e| {
            warn!("Corrupt record at {}: {}", key, e);
            e
        })?;

        debug!("Read {} bytes at offset {}", record.payload.len(), offset);
        Ok(record)
    }
}
