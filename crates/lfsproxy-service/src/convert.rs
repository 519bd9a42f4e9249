//! Conversions between stored lock records and their wire representation.

use lfsproxy_locks::FileLock;
use lfsproxy_model::{LockOwner, LockView};

/// Wire view of a stored lock. Owner ids never leave the server.
#[must_use]
pub fn lock_view(lock: &FileLock) -> LockView {
    LockView {
        id: lock.id.clone(),
        path: lock.path.clone(),
        locked_at: lock.locked_at,
        owner: LockOwner {
            name: lock.owner_name.clone(),
        },
    }
}

/// Wire views of several locks, in order.
#[must_use]
pub fn lock_views(locks: &[FileLock]) -> Vec<LockView> {
    locks.iter().map(lock_view).collect()
}
