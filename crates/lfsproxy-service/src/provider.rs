//! LFS provider implementing the batch, verify and locking operations.

use std::sync::Arc;

use lfsproxy_core::LfsProxyConfig;
use lfsproxy_http::RequestContext;
use lfsproxy_locks::{LockManager, LockStore};
use lfsproxy_model::{
    BatchRequest, BatchResponse, CreateLockRequest, LfsError, ListLocksResponse, LockResponse,
    Operation, UnlockRequest, VerifyLocksRequest, VerifyLocksResponse, VerifyRequest,
};
use lfsproxy_storage::{ObjectKeyResolver, ObjectStore};
use tracing::{debug, error};

use crate::batch::BatchEngine;
use crate::convert::{lock_view, lock_views};
use crate::error::lock_error_to_lfs;
use crate::verify::Verifier;

/// The LFS provider: one instance serves every repository.
#[derive(Debug)]
pub struct LfsProxyProvider {
    batch: BatchEngine,
    verifier: Verifier,
    locks: LockManager,
}

impl LfsProxyProvider {
    /// Create a provider over an object store and a lock store.
    #[must_use]
    pub fn new(
        config: &LfsProxyConfig,
        objects: Arc<dyn ObjectStore>,
        resolver: ObjectKeyResolver,
        locks: Arc<dyn LockStore>,
    ) -> Self {
        Self {
            batch: BatchEngine::new(
                Arc::clone(&objects),
                resolver.clone(),
                config.presigned_url_expiry_secs,
                config.batch_concurrency,
            ),
            verifier: Verifier::new(objects, resolver),
            locks: LockManager::new(locks),
        }
    }

    /// Handle `POST .../objects/batch`.
    pub async fn handle_batch(
        &self,
        ctx: &RequestContext,
        input: BatchRequest,
    ) -> Result<BatchResponse, LfsError> {
        let operation = Operation::from_name(&input.operation).ok_or_else(|| {
            LfsError::unprocessable(format!("Unsupported operation: {}", input.operation))
        })?;

        let verify_url = ctx.verify_url().ok_or_else(|| {
            error!(repository = %ctx.repository, "cannot build verify callback URL");
            LfsError::internal_error("Cannot determine the server URL for verify callbacks.")
        })?;

        let objects = self
            .batch
            .process(operation, &ctx.repository, input.objects, &verify_url)
            .await;
        Ok(BatchResponse::basic(objects))
    }

    /// Handle `POST .../objects/verify`.
    pub async fn handle_verify_object(
        &self,
        ctx: &RequestContext,
        input: VerifyRequest,
    ) -> Result<(), LfsError> {
        self.verifier
            .verify(&ctx.repository, &input.oid, input.size)
            .await
            .map_err(LfsError::from)
    }

    /// Handle `GET .../locks`.
    pub async fn handle_list_locks(
        &self,
        ctx: &RequestContext,
    ) -> Result<ListLocksResponse, LfsError> {
        let locks = self
            .locks
            .list(
                &ctx.repository,
                ctx.path_filter.as_deref(),
                ctx.id_filter.as_deref(),
            )
            .await
            .map_err(lock_error_to_lfs)?;
        debug!(repository = %ctx.repository, count = locks.len(), "listed locks");
        Ok(ListLocksResponse {
            locks: lock_views(&locks),
        })
    }

    /// Handle `POST .../locks`.
    pub async fn handle_create_lock(
        &self,
        ctx: &RequestContext,
        input: CreateLockRequest,
    ) -> Result<LockResponse, LfsError> {
        let lock = self
            .locks
            .create(&ctx.repository, &input.path, &ctx.user)
            .await
            .map_err(lock_error_to_lfs)?;
        Ok(LockResponse {
            lock: lock_view(&lock),
        })
    }

    /// Handle `POST .../locks/verify`.
    pub async fn handle_verify_locks(
        &self,
        ctx: &RequestContext,
        _input: VerifyLocksRequest,
    ) -> Result<VerifyLocksResponse, LfsError> {
        let partition = self
            .locks
            .verify(&ctx.repository, &ctx.user.id)
            .await
            .map_err(lock_error_to_lfs)?;
        Ok(VerifyLocksResponse {
            ours: lock_views(&partition.ours),
            theirs: lock_views(&partition.theirs),
        })
    }

    /// Handle `POST .../locks/{id}/unlock`. `force` is accepted but never
    /// lets a caller release somebody else's lock.
    pub async fn handle_unlock(
        &self,
        ctx: &RequestContext,
        input: UnlockRequest,
    ) -> Result<LockResponse, LfsError> {
        let id = ctx
            .lock_id
            .as_deref()
            .ok_or_else(|| LfsError::not_found("lock not found"))?;
        if input.force {
            debug!(repository = %ctx.repository, lock_id = id, "ignoring force flag on unlock");
        }

        let lock = self
            .locks
            .unlock(&ctx.repository, id, &ctx.user.id)
            .await
            .map_err(lock_error_to_lfs)?;
        Ok(LockResponse {
            lock: lock_view(&lock),
        })
    }
}
