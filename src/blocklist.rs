//! Block-list merging.
//!
//! Reconciles newly detected networks into the shared per-version block
//! list with a bounded-retry read-merge-write cycle. Concurrent writers are
//! expected; a write against a stale version token conflicts and the whole
//! cycle is retried with backoff instead of overwriting the other writer's
//! contribution.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::classify::IpVersion;
use crate::config::BlockListConfig;
use crate::store::{BlockListStore, StoreError, WriteOutcome};

/// Merge failures surfaced to the pipeline.
#[derive(Debug, Error)]
pub enum BlockListError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every attempt in the retry budget saw a conflicting token
    #[error("block-list update conflicted after {attempts} attempts")]
    ConcurrentUpdate { attempts: u32 },
}

/// Merges confirmed bot networks into the shared block lists.
pub struct BlockListMerger {
    store: Arc<dyn BlockListStore>,
    config: BlockListConfig,
}

impl BlockListMerger {
    pub fn new(store: Arc<dyn BlockListStore>, config: BlockListConfig) -> Self {
        Self { store, config }
    }

    fn set_name(&self, version: IpVersion) -> &str {
        match version {
            IpVersion::V4 => &self.config.ipv4_set_name,
            IpVersion::V6 => &self.config.ipv6_set_name,
        }
    }

    /// Merge a single canonical network into the list for its IP version.
    pub async fn block(&self, version: IpVersion, entry: &str) -> Result<(), BlockListError> {
        self.block_all(version, &[entry.to_string()]).await
    }

    /// Merge a batch of canonical networks into the list for one IP
    /// version. The target is treated as a set over canonical CIDR strings:
    /// entries already present are skipped, never duplicated, and a batch
    /// with nothing new writes nothing.
    pub async fn block_all(
        &self,
        version: IpVersion,
        entries: &[String],
    ) -> Result<(), BlockListError> {
        let scope = &self.config.scope;
        let name = self.set_name(version);
        let max_attempts = self.config.max_update_attempts.max(1);

        for attempt in 0..max_attempts {
            let snapshot = self.store.retrieve(version, scope, name).await?;

            let mut fresh: Vec<String> = Vec::new();
            for entry in entries {
                if !snapshot.addresses.iter().any(|a| a == entry)
                    && !fresh.iter().any(|a| a == entry)
                {
                    fresh.push(entry.clone());
                }
            }
            if fresh.is_empty() {
                return Ok(());
            }

            let mut merged = fresh;
            merged.extend(snapshot.addresses.iter().cloned());

            match self
                .store
                .update(version, scope, name, merged, &snapshot.token)
                .await?
            {
                WriteOutcome::Committed => return Ok(()),
                WriteOutcome::Conflict => {
                    debug!(
                        version = %version,
                        set = name,
                        attempt = attempt + 1,
                        "block-list update conflicted, retrying"
                    );
                    if attempt + 1 < max_attempts {
                        // Doubles per attempt, capped so the whole cycle
                        // stays well under the invocation's patience.
                        let backoff = (self.config.retry_backoff_ms << attempt.min(6)).min(500);
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }

        Err(BlockListError::ConcurrentUpdate {
            attempts: max_attempts,
        })
    }
}
