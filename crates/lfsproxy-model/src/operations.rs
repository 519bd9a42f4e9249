//! LFS operation enum.

use std::fmt;

/// All operations served under `/lfs/{owner}/{repo}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LfsOperation {
    // Transfer API
    /// Request upload/download actions for a set of objects.
    Batch,
    /// Confirm an uploaded object has the declared size.
    VerifyObject,

    // Locking API
    /// List the repository's locks, optionally filtered.
    ListLocks,
    /// Lock a path.
    CreateLock,
    /// Partition the repository's locks into ours and theirs.
    VerifyLocks,
    /// Release a lock by id.
    Unlock,
}

impl LfsOperation {
    /// Returns the operation name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Batch => "Batch",
            Self::VerifyObject => "VerifyObject",
            Self::ListLocks => "ListLocks",
            Self::CreateLock => "CreateLock",
            Self::VerifyLocks => "VerifyLocks",
            Self::Unlock => "Unlock",
        }
    }
}

impl fmt::Display for LfsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
