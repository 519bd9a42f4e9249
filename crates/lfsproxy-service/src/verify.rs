//! Post-upload object verification.

use std::sync::Arc;

use lfsproxy_core::RepositoryKey;
use lfsproxy_storage::{ObjectKeyResolver, ObjectStore};
use tracing::{info, warn};

use crate::error::VerifyError;

/// Confirms that an uploaded object has the size the client declared.
#[derive(Debug, Clone)]
pub struct Verifier {
    store: Arc<dyn ObjectStore>,
    resolver: ObjectKeyResolver,
}

impl Verifier {
    /// Create a verifier over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, resolver: ObjectKeyResolver) -> Self {
        Self { store, resolver }
    }

    /// Succeeds iff the object exists with exactly `expected` bytes.
    pub async fn verify(
        &self,
        repository: &RepositoryKey,
        oid: &str,
        expected: i64,
    ) -> Result<(), VerifyError> {
        let key = self.resolver.resolve(repository, oid)?;

        let Some(actual) = self.store.stat_size(&key).await? else {
            warn!(repository = %repository, oid, "verified object is missing");
            return Err(VerifyError::NotFound);
        };

        if u64::try_from(expected).ok() != Some(actual) {
            warn!(repository = %repository, oid, expected, actual, "verified object has wrong size");
            return Err(VerifyError::SizeMismatch { expected, actual });
        }

        info!(repository = %repository, oid, size = actual, "object verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lfsproxy_storage::InMemoryObjectStore;

    use super::*;

    const OID: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn setup(stored: Option<u64>) -> Verifier {
        let store = InMemoryObjectStore::new("bucket");
        let resolver = ObjectKeyResolver::default();
        if let Some(size) = stored {
            store.put(resolver.resolve(&repo(), OID).unwrap(), size);
        }
        Verifier::new(Arc::new(store), resolver)
    }

    fn repo() -> RepositoryKey {
        RepositoryKey::parse("alice/game").unwrap()
    }

    #[tokio::test]
    async fn test_should_accept_matching_size() {
        assert!(setup(Some(100)).verify(&repo(), OID, 100).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_report_size_mismatch() {
        match setup(Some(50)).verify(&repo(), OID, 100).await {
            Err(VerifyError::SizeMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (100, 50));
            }
            other => panic!("expected size mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_report_missing_object() {
        assert!(matches!(
            setup(None).verify(&repo(), OID, 100).await,
            Err(VerifyError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_should_accept_zero_byte_object() {
        assert!(setup(Some(0)).verify(&repo(), OID, 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_invalid_object_id() {
        assert!(matches!(
            setup(None).verify(&repo(), "xyz", 1).await,
            Err(VerifyError::InvalidObjectId(_))
        ));
    }

    #[tokio::test]
    async fn test_should_treat_negative_size_as_mismatch() {
        assert!(matches!(
            setup(Some(1)).verify(&repo(), OID, -1).await,
            Err(VerifyError::SizeMismatch { .. })
        ));
    }
}
