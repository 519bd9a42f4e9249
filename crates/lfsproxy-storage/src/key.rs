//! Object key layout.
//!
//! ```text
//! [<root prefix>/][<owner>/<repo>/]<oid[0..2]>/<oid[2..4]>/<oid>
//! ```

use lfsproxy_core::RepositoryKey;

use crate::error::KeyError;

/// Maps an object id to its key in the bucket.
///
/// # Examples
///
/// ```
/// use lfsproxy_core::RepositoryKey;
/// use lfsproxy_storage::ObjectKeyResolver;
///
/// let repo = RepositoryKey::from_parts("alice", "game").unwrap();
/// let resolver = ObjectKeyResolver::new("/lfs/", true);
/// assert_eq!(
///     resolver.resolve(&repo, "abcdef01").unwrap(),
///     "lfs/alice/game/ab/cd/abcdef01"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeyResolver {
    root_prefix: String,
    per_repo: bool,
}

impl Default for ObjectKeyResolver {
    fn default() -> Self {
        Self::new("", true)
    }
}

impl ObjectKeyResolver {
    /// Create a resolver. Leading and trailing `/` of `root_prefix` are
    /// dropped; an empty prefix means none.
    #[must_use]
    pub fn new(root_prefix: &str, per_repo: bool) -> Self {
        Self {
            root_prefix: root_prefix.trim_matches('/').to_owned(),
            per_repo,
        }
    }

    /// Resolve the bucket key of `oid` in `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::TooShort`] for ids under four characters and
    /// [`KeyError::NotHex`] for ids with non-hex characters.
    pub fn resolve(&self, repository: &RepositoryKey, oid: &str) -> Result<String, KeyError> {
        if oid.len() < 4 {
            return Err(KeyError::TooShort(oid.to_owned()));
        }
        if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(KeyError::NotHex(oid.to_owned()));
        }

        let mut key = String::with_capacity(
            self.root_prefix.len() + repository.as_str().len() + oid.len() + 8,
        );
        if !self.root_prefix.is_empty() {
            key.push_str(&self.root_prefix);
            key.push('/');
        }
        if self.per_repo {
            key.push_str(repository.as_str());
            key.push('/');
        }
        key.push_str(&oid[0..2]);
        key.push('/');
        key.push_str(&oid[2..4]);
        key.push('/');
        key.push_str(oid);
        Ok(key)
    }
}
