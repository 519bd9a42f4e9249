//! LFS handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use lfsproxy_core::{AuthenticatedUser, RepositoryKey};
use lfsproxy_model::{LfsError, LfsOperation};

use crate::body::LfsResponseBody;

/// Everything the HTTP layer learned about a request before dispatch.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Id echoed in `x-request-id` and error bodies.
    pub request_id: String,
    /// Validated repository key from the route.
    pub repository: RepositoryKey,
    /// Lock id of the unlock route.
    pub lock_id: Option<String>,
    /// `path` query filter of the list route.
    pub path_filter: Option<String>,
    /// `id` query filter of the list route.
    pub id_filter: Option<String>,
    /// Caller established by Basic authentication.
    pub user: AuthenticatedUser,
    /// External URL prefix for verify callbacks, e.g.
    /// `https://git.example.com/lfs`. `None` when the request carried no
    /// usable host.
    pub callback_base: Option<String>,
}

impl RequestContext {
    /// Verify callback URL for this repository.
    #[must_use]
    pub fn verify_url(&self) -> Option<String> {
        self.callback_base
            .as_deref()
            .map(|base| format!("{base}/lfs/{}/objects/verify", self.repository))
    }
}

/// Trait that the LFS business logic provider must implement.
///
/// The handler receives the routed operation, the request context and the
/// raw JSON body, and returns a complete HTTP response.
pub trait LfsHandler: Send + Sync + 'static {
    /// Handle an LFS operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: LfsOperation,
        ctx: RequestContext,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<http::Response<LfsResponseBody>, LfsError>> + Send>>;
}

/// Dispatch an LFS operation to the handler.
pub async fn dispatch_operation<H: LfsHandler>(
    handler: &H,
    op: LfsOperation,
    ctx: RequestContext,
    body: Bytes,
) -> Result<http::Response<LfsResponseBody>, LfsError> {
    tracing::debug!(
        operation = %op,
        repository = %ctx.repository,
        user = %ctx.user.name,
        "dispatching LFS operation"
    );
    handler.handle_operation(op, ctx, body).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(callback_base: Option<&str>) -> RequestContext {
        RequestContext {
            request_id: "req-1".into(),
            repository: RepositoryKey::parse("alice/game").unwrap(),
            lock_id: None,
            path_filter: None,
            id_filter: None,
            user: AuthenticatedUser::new("alice", "alice"),
            callback_base: callback_base.map(str::to_owned),
        }
    }

    #[test]
    fn test_should_build_verify_url_from_callback_base() {
        assert_eq!(
            context(Some("https://git.example.com/base")).verify_url().as_deref(),
            Some("https://git.example.com/base/lfs/alice/game/objects/verify")
        );
        assert!(context(None).verify_url().is_none());
    }
}
