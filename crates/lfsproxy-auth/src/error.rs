//! Authentication error types.

/// Errors raised while authenticating callers or signing URLs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carried no `Authorization` header.
    #[error("missing authorization header")]
    MissingAuthorization,

    /// The `Authorization` header is not a well-formed Basic credential.
    #[error("malformed authorization header: {0}")]
    MalformedAuthorization(String),

    /// Unknown user or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No users are configured, so nobody can ever authenticate.
    #[error("authentication is not configured on the server")]
    NotConfigured,

    /// A user entry in the configuration could not be parsed.
    #[error("invalid user entry: {0}")]
    InvalidUserEntry(String),

    /// The requested presigned URL lifetime is outside `1..=604800` seconds.
    #[error("presigned URL expiry must be between 1 and 604800 seconds, got {0}")]
    InvalidExpiry(u64),
}
