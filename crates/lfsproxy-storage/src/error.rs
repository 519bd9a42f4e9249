//! Storage error types.

use lfsproxy_auth::AuthError;

/// An object id that cannot be turned into a storage key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Fewer than four characters, so no `xx/yy/` fan-out can be built.
    #[error("object id {0:?} is too short, at least 4 characters are required")]
    TooShort(String),

    /// Contains characters other than ASCII hex digits.
    #[error("object id {0:?} is not a hex string")]
    NotHex(String),
}

/// Failures talking to the object store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The request could not be sent or timed out.
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a status the adapter does not understand.
    #[error("storage returned unexpected status {status} for {target}")]
    UnexpectedStatus {
        /// Object key or bucket the request was for.
        target: String,
        /// HTTP status code.
        status: u16,
    },

    /// A 200 HEAD response without a usable `Content-Length`.
    #[error("storage response for {0} has no valid content length")]
    MissingContentLength(String),

    /// URL signing failed.
    #[error("failed to sign storage request: {0}")]
    Signing(#[from] AuthError),

    /// Adapter configuration is invalid.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// Any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}
