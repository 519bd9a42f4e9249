//! Identity and namespace types shared across services.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::LfsProxyError;

/// Allowed shape of a repository key: `/`-separated, non-empty segments of
/// `[A-Za-z0-9_-]`.
static REPOSITORY_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]+(/[A-Za-z0-9_\-]+)*$").expect("static regex is valid")
});

/// Repository key (`owner/repo`).
///
/// Identifies both the lock namespace and the storage key namespace of one
/// repository. Construction validates the key so that it can be used as a
/// storage path component without allowing path traversal.
///
/// # Examples
///
/// ```
/// use lfsproxy_core::RepositoryKey;
///
/// let key = RepositoryKey::from_parts("alice", "assets").unwrap();
/// assert_eq!(key.as_str(), "alice/assets");
/// assert!(RepositoryKey::from_parts("alice", "..").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct RepositoryKey(String);

impl RepositoryKey {
    /// Build a key from the owner and repository route segments.
    ///
    /// # Errors
    /// Returns [`LfsProxyError::InvalidRepositoryKey`] if the joined key
    /// contains characters outside `[A-Za-z0-9_-/]` or empty segments.
    pub fn from_parts(owner: &str, repo: &str) -> Result<Self, LfsProxyError> {
        Self::parse(format!("{owner}/{repo}"))
    }

    /// Validate an already joined repository key.
    ///
    /// # Errors
    /// Returns [`LfsProxyError::InvalidRepositoryKey`] on invalid input.
    pub fn parse(key: impl Into<String>) -> Result<Self, LfsProxyError> {
        let key = key.into();
        if !REPOSITORY_KEY_PATTERN.is_match(&key) {
            return Err(LfsProxyError::InvalidRepositoryKey(key));
        }
        Ok(Self(key))
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated caller, as established by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthenticatedUser {
    /// Stable identifier used for lock ownership.
    pub id: String,
    /// Display name shown to other clients.
    pub name: String,
}

impl AuthenticatedUser {
    /// Create a new identity.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
