//! Per-repository exclusive file locks for lfsproxy.
//!
//! The [`LockManager`] owns the lock set of every repository. Each
//! read-modify-write of a set runs under that repository's gate from the
//! [`GateRegistry`], so two clients racing for the same path can never both
//! win. Persistence is pluggable through [`LockStore`]; the shipped
//! [`JsonFileLockStore`] keeps one JSON file per repository.

pub mod error;
pub mod gate;
pub mod json;
pub mod manager;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{LockError, LockStoreError};
pub use gate::GateRegistry;
pub use json::JsonFileLockStore;
pub use manager::{LockManager, LockPartition};
pub use memory::InMemoryLockStore;
pub use store::LockStore;
pub use types::FileLock;
