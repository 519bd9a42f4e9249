//! Authentication and URL signing for lfsproxy.
//!
//! The crate covers both directions of credentials the proxy deals with:
//!
//! - inbound: Git LFS clients authenticate with HTTP Basic credentials, which
//!   are checked against a [`UserProvider`];
//! - outbound: object transfers never pass through the proxy, clients receive
//!   AWS Signature Version 4 presigned URLs pointing straight at the bucket.
//!
//! # Usage
//!
//! ```rust
//! use lfsproxy_auth::basic::parse_basic_authorization;
//! use lfsproxy_auth::users::{StaticUserProvider, UserProvider};
//!
//! let provider = StaticUserProvider::from_list("alice:secret").unwrap();
//! let creds = parse_basic_authorization("Basic YWxpY2U6c2VjcmV0").unwrap();
//! let user = provider.authenticate(&creds.username, &creds.password).unwrap();
//! assert_eq!(user.name, "alice");
//! ```
//!
//! # Modules
//!
//! - [`basic`] - `Authorization: Basic` header parsing
//! - [`canonical`] - Canonical requests for presigned SigV4 URLs
//! - [`error`] - Authentication error types
//! - [`presigned`] - Presigned URL generation
//! - [`sigv4`] - SigV4 key derivation and signature computation
//! - [`users`] - User provider trait and static, environment-driven implementation

pub mod basic;
pub mod canonical;
pub mod error;
pub mod presigned;
pub mod sigv4;
pub mod users;

pub use basic::{BasicCredentials, parse_basic_authorization};
pub use error::AuthError;
pub use presigned::{PresignRequest, SigningCredentials, presign};
pub use users::{StaticUserProvider, UserProvider};
