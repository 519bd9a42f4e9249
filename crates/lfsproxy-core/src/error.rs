//! Error types for the lfsproxy core.

/// Core error type for lfsproxy infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum LfsProxyError {
    /// Repository name contains characters outside the allow-list.
    #[error("invalid repository name: {0}")]
    InvalidRepositoryKey(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
