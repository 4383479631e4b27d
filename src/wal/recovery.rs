//! WAL Recovery
//!
//! Rediscovers the tail of the log by listing its namespace.

use futures::TryStreamExt;
use tracing::{debug, info};

use super::LogHandle;
use crate::config::TailScan;
use crate::error::{LogError, Result};
use crate::record::Record;

impl LogHandle {
    /// Find, validate and return the last record
    ///
    /// This will:
    /// 1. List every key under the prefix
    /// 2. Pick the greatest key (see [`TailScan`])
    /// 3. Set `length` to its offset
    /// 4. Read that offset, returning its error unchanged if the tail is bad
    pub async fn last_record(&mut self) -> Result<Record> {
        let tail_key = self.scan_tail().await?.ok_or(LogError::EmptyLog)?;
        let offset = self.keys.decode(&tail_key)?;

        self.length = offset;
        info!("Recovered tail of {:?} at offset {}", self.prefix(), offset);

        self.read(offset).await
    }

    /// Walk the listing and return the tail key, if any
    async fn scan_tail(&self) -> Result<Option<String>> {
        let mut pages = self.store.list(self.keys.namespace());
        let mut tail: Option<String> = None;
        let mut page_count = 0usize;
        let mut key_count = 0usize;

        while let Some(page) = self
            .with_deadline("list", pages.try_next())
            .await?
            .map_err(LogError::StoreUnavailable)?
        {
            page_count += 1;
            key_count += page.len();

            let candidate = match self.config.tail_scan {
                TailScan::RunningMax => page.into_iter().max(),
                TailScan::TrustListingOrder => page.into_iter().last(),
            };
            let Some(candidate) = candidate else {
                continue;
            };

            let replace = match (&tail, self.config.tail_scan) {
                (None, _) => true,
                (Some(current), TailScan::RunningMax) => candidate > *current,
                (Some(_), TailScan::TrustListingOrder) => true,
            };
            if replace {
                tail = Some(candidate);
            }
        }

        debug!(
            "Scanned {} keys in {} pages under {:?}, tail {:?}",
            key_count,
            page_count,
            self.keys.namespace(),
            tail
        );
        Ok(tail)
    }
}
