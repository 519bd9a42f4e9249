//! In-memory lock store.

use async_trait::async_trait;
use dashmap::DashMap;
use lfsproxy_core::RepositoryKey;

use crate::error::LockStoreError;
use crate::store::LockStore;
use crate::types::FileLock;

/// [`LockStore`] that keeps lock sets in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    sets: DashMap<String, Vec<FileLock>>,
}

impl InMemoryLockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    fn location(&self, repository: &RepositoryKey) -> String {
        repository.to_string()
    }

    async fn load(&self, repository: &RepositoryKey) -> Result<Vec<FileLock>, LockStoreError> {
        Ok(self
            .sets
            .get(repository.as_str())
            .map(|set| set.clone())
            .unwrap_or_default())
    }

    async fn save(
        &self,
        repository: &RepositoryKey,
        locks: &[FileLock],
    ) -> Result<(), LockStoreError> {
        self.sets.insert(repository.to_string(), locks.to_vec());
        Ok(())
    }
}
