//! LFS handler implementation bridging HTTP to the provider.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use lfsproxy_http::body::LfsResponseBody;
use lfsproxy_http::dispatch::{LfsHandler, RequestContext};
use lfsproxy_http::response::{empty_response, json_response};
use lfsproxy_model::{LfsError, LfsOperation};

use crate::provider::LfsProxyProvider;

/// Handler that bridges the HTTP layer to the LFS provider.
#[derive(Debug)]
pub struct LfsProxyHandler {
    provider: Arc<LfsProxyProvider>,
}

impl LfsProxyHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<LfsProxyProvider>) -> Self {
        Self { provider }
    }
}

impl LfsHandler for LfsProxyHandler {
    fn handle_operation(
        &self,
        op: LfsOperation,
        ctx: RequestContext,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<LfsResponseBody>, LfsError>> + Send>> {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { dispatch(provider.as_ref(), op, &ctx, &body).await })
    }
}

/// Dispatch an LFS operation to the matching provider method.
async fn dispatch(
    provider: &LfsProxyProvider,
    op: LfsOperation,
    ctx: &RequestContext,
    body: &[u8],
) -> Result<http::Response<LfsResponseBody>, LfsError> {
    let ok = http::StatusCode::OK;
    match op {
        LfsOperation::Batch => {
            let output = provider.handle_batch(ctx, deserialize(body)?).await?;
            json_response(ok, &output, &ctx.request_id)
        }
        LfsOperation::VerifyObject => {
            provider.handle_verify_object(ctx, deserialize(body)?).await?;
            Ok(empty_response(ok, &ctx.request_id))
        }
        LfsOperation::ListLocks => {
            let output = provider.handle_list_locks(ctx).await?;
            json_response(ok, &output, &ctx.request_id)
        }
        LfsOperation::CreateLock => {
            let output = provider.handle_create_lock(ctx, deserialize(body)?).await?;
            json_response(http::StatusCode::CREATED, &output, &ctx.request_id)
        }
        LfsOperation::VerifyLocks => {
            let output = provider
                .handle_verify_locks(ctx, deserialize_or_default(body)?)
                .await?;
            json_response(ok, &output, &ctx.request_id)
        }
        LfsOperation::Unlock => {
            let output = provider
                .handle_unlock(ctx, deserialize_or_default(body)?)
                .await?;
            json_response(ok, &output, &ctx.request_id)
        }
    }
}

/// Deserialize a JSON request body into the input type.
fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, LfsError> {
    serde_json::from_slice(body)
        .map_err(|e| LfsError::bad_request(format!("Failed to deserialize request body: {e}")))
}

/// Like [`deserialize`], but an empty body yields the default input.
fn deserialize_or_default<T: serde::de::DeserializeOwned + Default>(
    body: &[u8],
) -> Result<T, LfsError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    deserialize(body)
}
