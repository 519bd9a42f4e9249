//! Git LFS HTTP service layer for lfsproxy.
//!
//! This crate implements the HTTP side of the Git LFS batch and locking APIs:
//!
//! - **Router**: maps method and path to an [`LfsOperation`](lfsproxy_model::LfsOperation)
//! - **Handler trait**: the boundary between HTTP and business logic
//! - **Service**: hyper `Service` doing health checks, Basic authentication,
//!   repository validation and dispatch
//! - **Response helpers**: `application/vnd.git-lfs+json` success and error bodies

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::LfsResponseBody;
pub use dispatch::{LfsHandler, RequestContext};
pub use service::{LfsHttpConfig, LfsHttpService};
