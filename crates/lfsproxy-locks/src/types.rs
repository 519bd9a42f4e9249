//! Lock record.

use chrono::{DateTime, Utc};
use lfsproxy_core::{AuthenticatedUser, RepositoryKey};
use serde::{Deserialize, Serialize};

/// An exclusive lock on one path of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLock {
    /// Lock id (UUID v4).
    pub id: String,
    /// Repository key the lock belongs to.
    pub repository: String,
    /// Locked path.
    pub path: String,
    /// Stable id of the holder.
    pub owner_id: String,
    /// Display name of the holder.
    pub owner_name: String,
    /// Creation time.
    pub locked_at: DateTime<Utc>,
}

impl FileLock {
    /// Create a lock held by `owner`, with a fresh id and the current time.
    #[must_use]
    pub fn new(repository: &RepositoryKey, path: impl Into<String>, owner: &AuthenticatedUser) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            repository: repository.to_string(),
            path: path.into(),
            owner_id: owner.id.clone(),
            owner_name: owner.name.clone(),
            locked_at: Utc::now(),
        }
    }

    /// Whether `owner_id` holds this lock.
    #[must_use]
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}
