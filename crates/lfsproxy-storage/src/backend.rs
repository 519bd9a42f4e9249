//! Storage capability consumed by the batch engine and the verifier.

use async_trait::async_trait;

use crate::error::StorageError;

/// What a HEAD on an object key found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStatus {
    /// No object under the key.
    Absent,
    /// An object of `size` bytes exists.
    Present {
        /// Stored size in bytes.
        size: u64,
    },
}

/// Object store operations needed to serve the LFS transfer API.
///
/// Implementors provide [`head`](ObjectStore::head) and the two presigning
/// methods; [`exists`](ObjectStore::exists) and
/// [`stat_size`](ObjectStore::stat_size) derive from `head`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Look up an object without fetching it.
    async fn head(&self, key: &str) -> Result<ObjectStatus, StorageError>;

    /// URL the client can `PUT` the object to for `ttl_secs` seconds.
    fn presign_upload(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError>;

    /// URL the client can `GET` the object from for `ttl_secs` seconds.
    fn presign_download(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError>;

    /// Check that the store is reachable and the bucket accessible.
    async fn check_ready(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Returns `(exists, size)`. A zero-byte object counts as absent.
    async fn exists(&self, key: &str) -> Result<(bool, u64), StorageError> {
        Ok(match self.head(key).await? {
            ObjectStatus::Present { size } => (size > 0, size),
            ObjectStatus::Absent => (false, 0),
        })
    }

    /// Returns the stored size, or `None` if there is no object.
    async fn stat_size(&self, key: &str) -> Result<Option<u64>, StorageError> {
        Ok(match self.head(key).await? {
            ObjectStatus::Present { size } => Some(size),
            ObjectStatus::Absent => None,
        })
    }
}
