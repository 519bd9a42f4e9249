//! Core types, configuration, and errors for lfsproxy.
//!
//! This crate provides the building blocks shared by every lfsproxy crate:
//! the validated [`RepositoryKey`] used as lock and storage namespace, the
//! [`AuthenticatedUser`] identity handed to the lock manager, and the
//! environment-driven [`LfsProxyConfig`].

mod config;
mod error;
mod types;

pub use config::{LfsProxyConfig, parse_bool};
pub use error::LfsProxyError;
pub use types::{AuthenticatedUser, RepositoryKey};
