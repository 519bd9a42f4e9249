//! Batch protocol engine.
//!
//! Decides per object whether the client has to transfer anything and hands
//! out the presigned actions to do so. Objects are resolved concurrently, up
//! to a configurable limit, and reported in request order. A failure while
//! resolving one object only affects that object's result.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use lfsproxy_core::RepositoryKey;
use lfsproxy_model::{
    ActionLink, ObjectActions, ObjectError, ObjectResult, ObjectSpec, Operation, TransferAction,
};
use lfsproxy_storage::{ObjectKeyResolver, ObjectStore, StorageError};
use tracing::{debug, error, warn};

/// Message of the per-object error for backend failures.
pub const OBJECT_INTERNAL_ERROR: &str = "Internal server error while processing object.";

/// Message of the per-object error for downloads of missing objects.
pub const OBJECT_NOT_FOUND: &str = "Object not found";

/// Resolves batch requests against an object store.
#[derive(Debug, Clone)]
pub struct BatchEngine {
    store: Arc<dyn ObjectStore>,
    resolver: ObjectKeyResolver,
    expires_in: u64,
    concurrency: usize,
}

impl BatchEngine {
    /// Create an engine issuing actions valid for `expires_in` seconds and
    /// resolving at most `concurrency` objects at a time.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        resolver: ObjectKeyResolver,
        expires_in: u64,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            resolver,
            expires_in,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve every object of a batch.
    ///
    /// `verify_url` is the callback attached to upload actions. Results are
    /// in the order of `objects`.
    pub async fn process(
        &self,
        operation: Operation,
        repository: &RepositoryKey,
        objects: Vec<ObjectSpec>,
        verify_url: &str,
    ) -> Vec<ObjectResult> {
        debug!(
            operation = %operation,
            repository = %repository,
            count = objects.len(),
            "processing batch"
        );

        stream::iter(objects)
            .map(|object| self.process_object(operation, repository, object, verify_url))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn process_object(
        &self,
        operation: Operation,
        repository: &RepositoryKey,
        object: ObjectSpec,
        verify_url: &str,
    ) -> ObjectResult {
        if object.size < 0 {
            return ObjectResult::with_error(
                object.oid,
                object.size,
                ObjectError::new(422, "Object size must not be negative."),
            );
        }

        let key = match self.resolver.resolve(repository, &object.oid) {
            Ok(key) => key,
            Err(e) => {
                debug!(oid = %object.oid, error = %e, "rejecting object id");
                return ObjectResult::with_error(object.oid, object.size, ObjectError::new(422, e.to_string()));
            }
        };

        match self.decide(operation, &key, verify_url).await {
            Ok(Decision::Actions(actions)) => ObjectResult::with_actions(object.oid, object.size, actions),
            Ok(Decision::Missing) => {
                warn!(repository = %repository, oid = %object.oid, "requested download of missing object");
                ObjectResult::with_error(object.oid, object.size, ObjectError::new(404, OBJECT_NOT_FOUND))
            }
            Err(e) => {
                error!(repository = %repository, oid = %object.oid, error = %e, "failed to process object");
                ObjectResult::with_error(
                    object.oid,
                    object.size,
                    ObjectError::new(500, OBJECT_INTERNAL_ERROR),
                )
            }
        }
    }

    async fn decide(
        &self,
        operation: Operation,
        key: &str,
        verify_url: &str,
    ) -> Result<Decision, StorageError> {
        let (exists, _) = self.store.exists(key).await?;

        let mut actions = ObjectActions::new();
        match operation {
            Operation::Upload if exists => {}
            Operation::Upload => {
                actions.push(TransferAction::Upload(
                    self.link(self.store.presign_upload(key, self.expires_in)?),
                ));
                actions.push(TransferAction::Verify(self.link(verify_url.to_owned())));
            }
            Operation::Download if exists => {
                actions.push(TransferAction::Download(
                    self.link(self.store.presign_download(key, self.expires_in)?),
                ));
            }
            Operation::Download => return Ok(Decision::Missing),
        }
        Ok(Decision::Actions(actions))
    }

    fn link(&self, href: String) -> ActionLink {
        ActionLink {
            href,
            expires_in: self.expires_in,
        }
    }
}

enum Decision {
    Actions(ObjectActions),
    Missing,
}
