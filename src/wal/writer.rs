//! WAL Writer
//!
//! Appends records through conditional creates.

use tracing::{debug, warn};

use super::LogHandle;
use crate::error::{LogError, Result};
use crate::record;
use crate::store::{PutMode, StoreError};

impl LogHandle {
    /// Append `payload` as the next record
    ///
    /// Steps:
    /// 1. Check the size budget (`length + payload.len() <= size_limit`)
    /// 2. Frame the record for offset `length + 1`
    /// 3. Create the object, failing if the key already exists
    /// 4. Advance `length`
    ///
    /// On any error `length` is left untouched. A `Conflict` means another
    /// writer owns the offset; learn the new tail before trying again.
    pub async fn append(&mut self, payload: &[u8], size_limit: u64) -> Result<u64> {
        let payload_len = payload.len() as u64;
        let within_limit = self
            .length
            .checked_add(payload_len)
            .is_some_and(|total| total <= size_limit);
        if !within_limit {
            return Err(LogError::SizeLimitExceeded {
                length: self.length,
                payload_len,
                limit: size_limit,
            });
        }

        let offset = self.length.checked_add(1).ok_or(LogError::OffsetExhausted)?;
        let key = self.keys.encode(offset);
        let frame = record::encode(offset, payload);

        match self
            .with_deadline("put", self.store.put(&key, frame, PutMode::Create))
            .await?
        {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                warn!("Append conflict at {}: offset already taken", key);
                return Err(LogError::Conflict { offset });
            }
            Err(e) => return Err(LogError::StoreUnavailable(e)),
        }

        self.length = offset;
        debug!("Appended {} bytes at offset {}", payload_len, offset);
        Ok(offset)
    }

    /// Append using the configured size limit
    pub async fn append_default(&mut self, payload: &[u8]) -> Result<u64> {
        let limit = self.config.size_limit;
        self.append(payload, limit).await
    }
}
