//! Service error types and their mapping onto LFS API errors.

use lfsproxy_locks::{LockError, LockStoreError};
use lfsproxy_model::LfsError;
use lfsproxy_storage::{KeyError, StorageError};

use crate::convert::lock_view;

/// Outcome of a failed object verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// No object under the resolved key.
    #[error("Object not found during verification.")]
    NotFound,

    /// The stored object has a different size than the client declared.
    #[error("Size mismatch. Expected: {expected}, Actual: {actual}")]
    SizeMismatch {
        /// Size sent by the client.
        expected: i64,
        /// Size found in storage.
        actual: u64,
    },

    /// The object id cannot be mapped to a key.
    #[error(transparent)]
    InvalidObjectId(#[from] KeyError),

    /// The object store failed.
    #[error(transparent)]
    Backend(#[from] StorageError),
}

impl From<VerifyError> for LfsError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NotFound => LfsError::not_found(err.to_string()),
            VerifyError::SizeMismatch { .. } | VerifyError::InvalidObjectId(_) => {
                LfsError::unprocessable(err.to_string())
            }
            VerifyError::Backend(source) => {
                LfsError::internal_error("Internal server error while verifying object.")
                    .with_source(source)
            }
        }
    }
}

/// Convert a lock manager error into an API error.
///
/// Conflicts carry the existing lock, store failures are hidden behind a
/// generic message.
pub fn lock_error_to_lfs(err: LockError) -> LfsError {
    match err {
        LockError::Conflict(existing) => LfsError::lock_conflict(lock_view(&existing)),
        LockError::NotFound(_) => LfsError::not_found("lock not found"),
        LockError::NotOwner(existing) => LfsError::forbidden(format!(
            "lock {} is owned by {}",
            existing.id, existing.owner_name
        )),
        LockError::InvalidPath => LfsError::unprocessable(err.to_string()),
        LockError::Store(source) => store_error_to_lfs(source),
    }
}

fn store_error_to_lfs(err: LockStoreError) -> LfsError {
    LfsError::internal_error("Internal server error while accessing locks.").with_source(err)
}
