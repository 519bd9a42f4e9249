//! Git LFS business logic for lfsproxy.
//!
//! - [`batch`]: the batch protocol engine deciding per object which
//!   transfer actions a client needs
//! - [`verify`]: post-upload size verification
//! - [`provider`]: the operations behind every LFS route, locking included
//! - [`handler`]: the [`LfsHandler`](lfsproxy_http::LfsHandler) bridging
//!   the HTTP layer to the provider

pub mod batch;
pub mod convert;
pub mod error;
pub mod handler;
pub mod provider;
pub mod verify;

pub use batch::BatchEngine;
pub use error::{VerifyError, lock_error_to_lfs};
pub use handler::LfsProxyHandler;
pub use provider::LfsProxyProvider;
pub use verify::Verifier;
