//! Object storage for lfsproxy.
//!
//! Objects live in an S3-compatible bucket and never flow through the proxy:
//! the proxy only checks whether a key exists and hands out presigned URLs.
//!
//! - [`key`] maps `(repository, oid)` to a bucket key
//! - [`backend`] defines the [`ObjectStore`] capability the batch engine uses
//! - [`s3`] implements it against S3 with SigV4 presigned requests
//! - [`memory`] implements it in memory for tests and local development

pub mod backend;
pub mod error;
pub mod key;
pub mod memory;
pub mod s3;

pub use backend::{ObjectStatus, ObjectStore};
pub use error::{KeyError, StorageError};
pub use key::ObjectKeyResolver;
pub use memory::InMemoryObjectStore;
pub use s3::{S3ObjectStore, S3StoreConfig};
