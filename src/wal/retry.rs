//! Bounded append retry
//!
//! The core append never retries. This wrapper composes the two recoveries
//! a caller needs:
//! - `Conflict`: another writer took the offset. Relearn the tail, retry.
//! - `Timeout`: the put may or may not have committed. Read the attempted
//!   offset to find out before doing anything else.
//!
//! A timed-out put can still land after the read that reconciled it. A later
//! `Conflict` on that same offset may therefore be our own write, so it is
//! reconciled again instead of being treated as a lost race.

use tracing::{info, warn};

use super::LogHandle;
use crate::error::{LogError, Result};

impl LogHandle {
    /// Append with the configured [`RetryPolicy`](crate::config::RetryPolicy)
    ///
    /// Returns the offset the payload ended up at. Errors other than
    /// `Conflict` and `Timeout` are returned immediately, as is the last error
    /// once attempts run out.
    pub async fn append_with_retry(&mut self, payload: &[u8], size_limit: u64) -> Result<u64> {
        let policy = self.config.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        // Offset of a timed-out put that may still commit
        let mut pending: Option<u64> = None;

        loop {
            let err = match self.append(payload, size_limit).await {
                Ok(offset) => return Ok(offset),
                Err(e) => e,
            };

            match err {
                LogError::Conflict { offset } if pending == Some(offset) => {
                    warn!(
                        "Attempt {}/{} hit offset {} of an earlier timed-out put, reconciling",
                        attempt, max_attempts, offset
                    );
                    if let Some(offset) = self.reconcile(offset, payload).await? {
                        return Ok(offset);
                    }
                }
                LogError::Conflict { offset } => {
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    warn!(
                        "Attempt {}/{} lost offset {}, refreshing tail",
                        attempt, max_attempts, offset
                    );
                    self.refresh_tail().await?;
                }
                LogError::Timeout { .. } => {
                    // A failed append never moves `length`
                    let attempted = self.length + 1;
                    pending = Some(attempted);
                    warn!(
                        "Attempt {}/{} timed out at offset {}, reconciling",
                        attempt, max_attempts, attempted
                    );
                    if let Some(offset) = self.reconcile(attempted, payload).await? {
                        return Ok(offset);
                    }
                }
                _ => return Err(err),
            }

            if attempt >= max_attempts {
                return Err(err);
            }
            attempt += 1;
            tokio::time::sleep(policy.backoff).await;
        }
    }

    /// Settle an indeterminate append at `offset`
    ///
    /// Returns `Some(offset)` when the record there is ours. Identical
    /// payloads from another writer are indistinguishable and count as ours.
    async fn reconcile(&mut self, offset: u64, payload: &[u8]) -> Result<Option<u64>> {
        match self.read(offset).await {
            Ok(record) if record.payload.as_ref() == payload => {
                info!("Indeterminate append at offset {} had committed", offset);
                self.length = offset;
                Ok(Some(offset))
            }
            Ok(_) => {
                self.refresh_tail().await?;
                Ok(None)
            }
            Err(LogError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Re-run recovery for its effect on `length`
    async fn refresh_tail(&mut self) -> Result<()> {
        match self.last_record().await {
            Ok(_) | Err(LogError::EmptyLog) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
