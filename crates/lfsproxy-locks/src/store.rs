//! Lock persistence trait.

use async_trait::async_trait;
use lfsproxy_core::RepositoryKey;

use crate::error::LockStoreError;
use crate::types::FileLock;

/// Durable storage of one lock set per repository.
///
/// Stores do no locking of their own; the [`LockManager`](crate::LockManager)
/// serializes every load/save pair of a repository.
#[async_trait]
pub trait LockStore: Send + Sync + std::fmt::Debug {
    /// Identifier of the physical location a repository's set lives at.
    ///
    /// Two keys mapping to the same location share one gate.
    fn location(&self, repository: &RepositoryKey) -> String;

    /// Load the lock set. A repository without stored locks has an empty set.
    async fn load(&self, repository: &RepositoryKey) -> Result<Vec<FileLock>, LockStoreError>;

    /// Replace the lock set. The new set is durable when this returns.
    async fn save(
        &self,
        repository: &RepositoryKey,
        locks: &[FileLock],
    ) -> Result<(), LockStoreError>;
}
