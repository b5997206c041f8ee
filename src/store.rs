//! Shared block-list store access.
//!
//! The block lists live in an external store shared by many unsynchronized
//! invocations, so the contract is built around optimistic versioning:
//! every read carries an opaque token identifying the state that was seen,
//! and a write against a stale token is reported as a conflict instead of
//! silently winning.

use std::collections::HashMap;

use async_trait::async_trait;
use ipnet::IpNet;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::classify::IpVersion;

/// Opaque token identifying the list state a client read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One consistent read of a block list.
#[derive(Debug, Clone)]
pub struct BlockListSnapshot {
    /// Entries in store order
    pub addresses: Vec<String>,
    /// Token to present with the next write
    pub token: VersionToken,
}

/// Result of a versioned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was applied
    Committed,
    /// The presented token was stale; nothing was written
    Conflict,
}

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure talking to the store
    #[error("block-list store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the update payload
    #[error("block-list store rejected update: {0}")]
    Rejected(String),
}

/// Read/write access to a shared, versioned block list per IP version.
/// Scope and name identify the list within the store and come from
/// configuration.
#[async_trait]
pub trait BlockListStore: Send + Sync {
    async fn retrieve(
        &self,
        version: IpVersion,
        scope: &str,
        name: &str,
    ) -> Result<BlockListSnapshot, StoreError>;

    async fn update(
        &self,
        version: IpVersion,
        scope: &str,
        name: &str,
        addresses: Vec<String>,
        token: &VersionToken,
    ) -> Result<WriteOutcome, StoreError>;
}

#[derive(Debug, Default)]
struct ListState {
    addresses: Vec<String>,
    revision: u64,
}

/// Process-local store implementing the optimistic-versioning contract.
/// Used by the binary and the test suite; a networked deployment swaps in
/// its own `BlockListStore` implementation.
#[derive(Debug, Default)]
pub struct InMemoryBlockListStore {
    lists: Mutex<HashMap<(IpVersion, String, String), ListState>>,
}

impl InMemoryBlockListStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockListStore for InMemoryBlockListStore {
    async fn retrieve(
        &self,
        version: IpVersion,
        scope: &str,
        name: &str,
    ) -> Result<BlockListSnapshot, StoreError> {
        let mut lists = self.lists.lock().await;
        let state = lists
            .entry((version, scope.to_string(), name.to_string()))
            .or_default();
        Ok(BlockListSnapshot {
            addresses: state.addresses.clone(),
            token: VersionToken::new(state.revision.to_string()),
        })
    }

    async fn update(
        &self,
        version: IpVersion,
        scope: &str,
        name: &str,
        addresses: Vec<String>,
        token: &VersionToken,
    ) -> Result<WriteOutcome, StoreError> {
        for address in &addresses {
            if address.parse::<IpNet>().is_err() {
                return Err(StoreError::Rejected(format!(
                    "not a CIDR network: {address:?}"
                )));
            }
        }

        let mut lists = self.lists.lock().await;
        let state = lists
            .entry((version, scope.to_string(), name.to_string()))
            .or_default();

        if token.as_str() != state.revision.to_string() {
            return Ok(WriteOutcome::Conflict);
        }

        state.addresses = addresses;
        state.revision += 1;
        Ok(WriteOutcome::Committed)
    }
}
