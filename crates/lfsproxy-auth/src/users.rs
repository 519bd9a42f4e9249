//! User provider trait and a static implementation.
//!
//! The [`UserProvider`] trait abstracts over where user accounts come from.
//! [`StaticUserProvider`] keeps a fixed list, typically loaded from the
//! `LFS_USERS` environment variable.

use std::collections::HashMap;

use lfsproxy_core::AuthenticatedUser;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;

/// Checks a username/password pair and resolves the caller identity.
pub trait UserProvider: Send + Sync {
    /// Authenticate a caller.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a wrong
    /// password, and [`AuthError::NotConfigured`] when no user exists at all.
    fn authenticate(&self, username: &str, password: &str)
    -> Result<AuthenticatedUser, AuthError>;

    /// Whether at least one account is configured.
    fn is_configured(&self) -> bool;
}

#[derive(Clone)]
struct UserEntry {
    id: String,
    password: String,
}

/// A user provider backed by an in-memory table.
///
/// # Examples
///
/// ```
/// use lfsproxy_auth::users::{StaticUserProvider, UserProvider};
///
/// let provider = StaticUserProvider::from_list("alice:pw:u-1,bob:pw2").unwrap();
/// let alice = provider.authenticate("alice", "pw").unwrap();
/// assert_eq!(alice.id, "u-1");
/// let bob = provider.authenticate("bob", "pw2").unwrap();
/// assert_eq!(bob.id, "bob");
/// ```
#[derive(Clone, Default)]
pub struct StaticUserProvider {
    users: HashMap<String, UserEntry>,
}

impl std::fmt::Debug for StaticUserProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticUserProvider")
            .field("user_count", &self.users.len())
            .finish_non_exhaustive()
    }
}

impl StaticUserProvider {
    /// Create a provider from `(name, password, id)` triples.
    #[must_use]
    pub fn new(users: Vec<(String, String, String)>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|(name, password, id)| (name, UserEntry { id, password }))
                .collect(),
        }
    }

    /// Parse a comma-separated list of `name:password[:id]` entries.
    ///
    /// The id defaults to the name. Blank entries are skipped, so an empty
    /// string yields a provider with no users. `:` separates the fields, so
    /// names, passwords and ids cannot contain it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUserEntry`] for an entry with an empty name,
    /// a missing or empty password, an empty explicit id, more than three
    /// fields, or a name that was already listed.
    pub fn from_list(list: &str) -> Result<Self, AuthError> {
        let mut users: Vec<(String, String, String)> = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut fields = entry.split(':');
            let name = fields.next().unwrap_or_default();
            let password = fields.next().unwrap_or_default();
            let id = fields.next().unwrap_or(name);

            if name.is_empty() || password.is_empty() || id.is_empty() || fields.next().is_some() {
                let shown = if name.is_empty() { "<empty>" } else { name };
                return Err(AuthError::InvalidUserEntry(format!(
                    "entry for user {shown} must look like name:password[:id]"
                )));
            }
            if users.iter().any(|(existing, _, _)| existing == name) {
                return Err(AuthError::InvalidUserEntry(format!("user {name} is listed twice")));
            }
            users.push((name.to_owned(), password.to_owned(), id.to_owned()));
        }
        Ok(Self::new(users))
    }

    /// Load users from the `LFS_USERS` environment variable.
    ///
    /// # Errors
    ///
    /// Propagates parse errors from [`StaticUserProvider::from_list`].
    pub fn from_env() -> Result<Self, AuthError> {
        let list = std::env::var("LFS_USERS").unwrap_or_default();
        Self::from_list(&list)
    }

    /// Number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no account is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserProvider for StaticUserProvider {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        if self.users.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let Some(entry) = self.users.get(username) else {
            debug!(username, "unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if entry.password.as_bytes().ct_eq(password.as_bytes()).into() {
            Ok(AuthenticatedUser::new(entry.id.clone(), username))
        } else {
            debug!(username, "password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }

    fn is_configured(&self) -> bool {
        !self.users.is_empty()
    }
}
