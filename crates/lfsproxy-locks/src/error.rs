//! Lock error types.

use std::path::PathBuf;

use crate::types::FileLock;

/// Failures of a [`LockStore`](crate::LockStore).
#[derive(Debug, thiserror::Error)]
pub enum LockStoreError {
    /// Reading or writing the backing file failed.
    #[error("lock store I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a valid lock set.
    #[error("lock file {path} is corrupt: {source}")]
    Corrupt {
        /// The unreadable file.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The lock set could not be encoded.
    #[error("failed to encode lock set: {0}")]
    Encode(#[from] serde_json::Error),

    /// A blocking write task panicked or was cancelled.
    #[error("lock store task failed: {0}")]
    Task(String),
}

/// Outcomes of lock operations other than success.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The path is already locked; carries the existing lock.
    #[error("path {} is already locked by {}", .0.path, .0.owner_name)]
    Conflict(Box<FileLock>),

    /// No lock with this id.
    #[error("lock {0} not found")]
    NotFound(String),

    /// The caller does not hold the lock; carries it unchanged.
    #[error("lock {} is owned by {}", .0.id, .0.owner_name)]
    NotOwner(Box<FileLock>),

    /// An empty path cannot be locked.
    #[error("lock path must not be empty")]
    InvalidPath,

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] LockStoreError),
}
