//! In-memory object store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend::{ObjectStatus, ObjectStore};
use crate::error::StorageError;

/// Object store that only remembers key sizes.
///
/// Presigned URLs point at `memory://<bucket>/<key>` and carry the method and
/// lifetime as query parameters, so tests can assert on them.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    bucket: String,
    objects: DashMap<String, u64>,
}

impl InMemoryObjectStore {
    /// Create an empty store for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: DashMap::new(),
        }
    }

    /// Record an object of `size` bytes under `key`.
    pub fn put(&self, key: impl Into<String>, size: u64) {
        self.objects.insert(key.into(), size);
    }

    /// Forget `key`. Returns `true` if it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn url(&self, method: &str, key: &str, ttl_secs: u64) -> String {
        format!(
            "memory://{}/{key}?method={method}&expires_in={ttl_secs}",
            self.bucket
        )
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn head(&self, key: &str) -> Result<ObjectStatus, StorageError> {
        Ok(self
            .objects
            .get(key)
            .map_or(ObjectStatus::Absent, |size| ObjectStatus::Present { size: *size }))
    }

    fn presign_upload(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        Ok(self.url("PUT", key, ttl_secs))
    }

    fn presign_download(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        Ok(self.url("GET", key, ttl_secs))
    }
}
