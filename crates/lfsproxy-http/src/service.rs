//! LFS HTTP service implementing the hyper `Service` trait.
//!
//! Request pipeline:
//!
//! 1. Routing, including base path stripping (404/405 on mismatch)
//! 2. Health check interception (no authentication)
//! 3. Basic authentication against the configured users
//! 4. Repository key validation
//! 5. Query filters and the verify callback base
//! 6. Request body collection
//! 7. Operation dispatch to the [`LfsHandler`]
//! 8. Common response headers (`x-request-id`, `Server`)

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use lfsproxy_auth::{AuthError, UserProvider, parse_basic_authorization};
use lfsproxy_core::{AuthenticatedUser, RepositoryKey};
use lfsproxy_model::{LfsError, LfsOperation};
use tracing::{debug, warn};

use crate::body::LfsResponseBody;
use crate::dispatch::{LfsHandler, RequestContext, dispatch_operation};
use crate::response::{CONTENT_TYPE, error_to_response};
use crate::router::{Route, lock_filters, resolve_route};

/// Configuration for the LFS HTTP service.
#[derive(Clone)]
pub struct LfsHttpConfig {
    /// Prefix all routes live under, `""` or `/a[/b...]`.
    pub base_path: String,
    /// External root URL used for verify callbacks instead of the request's
    /// host headers.
    pub public_url: Option<String>,
    /// Accounts accepted by Basic authentication.
    pub users: Arc<dyn UserProvider>,
}

impl LfsHttpConfig {
    /// Serve at the root with callbacks derived from request headers.
    #[must_use]
    pub fn new(users: Arc<dyn UserProvider>) -> Self {
        Self {
            base_path: String::new(),
            public_url: None,
            users,
        }
    }
}

impl std::fmt::Debug for LfsHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LfsHttpConfig")
            .field("base_path", &self.base_path)
            .field("public_url", &self.public_url)
            .field("users_configured", &self.users.is_configured())
            .finish()
    }
}

/// Hyper `Service` implementation for the Git LFS API.
///
/// Wraps an [`LfsHandler`] implementation and routes incoming HTTP requests
/// to the matching LFS operation.
#[derive(Debug)]
pub struct LfsHttpService<H: LfsHandler> {
    handler: Arc<H>,
    config: Arc<LfsHttpConfig>,
}

impl<H: LfsHandler> LfsHttpService<H> {
    /// Create a new `LfsHttpService`.
    pub fn new(handler: Arc<H>, config: LfsHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: LfsHandler> Clone for LfsHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: LfsHandler> hyper::service::Service<http::Request<Incoming>> for LfsHttpService<H> {
    type Response = http::Response<LfsResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let response = process_request(req, handler.as_ref(), &config, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process a single LFS HTTP request through the full pipeline.
async fn process_request<B, H>(
    req: http::Request<B>,
    handler: &H,
    config: &LfsHttpConfig,
    request_id: &str,
) -> http::Response<LfsResponseBody>
where
    B: http_body::Body + Send,
    B::Error: Display,
    H: LfsHandler,
{
    let (parts, incoming) = req.into_parts();

    match handle_request(&parts, incoming, handler, config, request_id).await {
        Ok(response) => {
            debug!(
                method = %parts.method,
                path = %parts.uri.path(),
                status = %response.status(),
                request_id,
                "request completed"
            );
            response
        }
        Err(err) => {
            if err.status_code.is_server_error() {
                warn!(method = %parts.method, path = %parts.uri.path(), error = %err, request_id, "request failed");
            } else {
                debug!(method = %parts.method, path = %parts.uri.path(), error = %err, request_id, "request rejected");
            }
            error_to_response(&err, request_id)
        }
    }
}

async fn handle_request<B, H>(
    parts: &http::request::Parts,
    incoming: B,
    handler: &H,
    config: &LfsHttpConfig,
    request_id: &str,
) -> Result<http::Response<LfsResponseBody>, LfsError>
where
    B: http_body::Body + Send,
    B::Error: Display,
    H: LfsHandler,
{
    // 1. Route.
    let routed = match resolve_route(&parts.method, parts.uri.path(), &config.base_path)? {
        Route::Health => return Ok(health_check_response()),
        Route::Lfs(routed) => routed,
    };

    // 2. Authenticate.
    let user = authenticate(&parts.headers, config.users.as_ref())?;

    // 3. Repository.
    let repository = RepositoryKey::from_parts(&routed.owner, &routed.repo)
        .map_err(|e| LfsError::bad_request(e.to_string()))?;

    // 4. Context.
    let (path_filter, id_filter) = if routed.operation == LfsOperation::ListLocks {
        lock_filters(parts.uri.query())
    } else {
        (None, None)
    };
    let ctx = RequestContext {
        request_id: request_id.to_owned(),
        repository,
        lock_id: routed.lock_id,
        path_filter,
        id_filter,
        user,
        callback_base: callback_base(parts, config),
    };

    // 5. Collect body.
    let body = collect_body(incoming).await?;

    // 6. Dispatch to handler.
    dispatch_operation(handler, routed.operation, ctx, body).await
}

/// Resolve the caller from the `Authorization` header.
fn authenticate(
    headers: &http::HeaderMap,
    users: &dyn UserProvider,
) -> Result<AuthenticatedUser, LfsError> {
    if !users.is_configured() {
        return Err(LfsError::not_configured());
    }

    let header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(LfsError::unauthorized)?;
    let credentials = parse_basic_authorization(header).map_err(|e| {
        debug!(error = %e, "unusable authorization header");
        LfsError::unauthorized()
    })?;

    users
        .authenticate(&credentials.username, &credentials.password)
        .map_err(|e| match e {
            AuthError::NotConfigured => LfsError::not_configured(),
            other => {
                debug!(user = %credentials.username, error = %other, "authentication failed");
                LfsError::unauthorized()
            }
        })
}

/// External URL prefix for verify callbacks.
///
/// A configured public URL wins. Otherwise the URL is rebuilt from
/// `X-Forwarded-Proto` (default `http`), then `X-Forwarded-Host`, `Host` or
/// the request authority, followed by the base path.
fn callback_base(parts: &http::request::Parts, config: &LfsHttpConfig) -> Option<String> {
    if let Some(url) = &config.public_url {
        return Some(url.clone());
    }

    let host = first_header_value(&parts.headers, "x-forwarded-host")
        .or_else(|| first_header_value(&parts.headers, http::header::HOST.as_str()))
        .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))?;
    let scheme = first_header_value(&parts.headers, "x-forwarded-proto").unwrap_or("http");

    Some(format!("{scheme}://{host}{}", config.base_path))
}

/// First entry of a possibly comma-separated header, if non-empty.
fn first_header_value<'a>(headers: &'a http::HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body<B>(incoming: B) -> Result<Bytes, LfsError>
where
    B: http_body::Body + Send,
    B::Error: Display,
{
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| LfsError::bad_request(format!("Failed to read request body: {e}")))
}

/// Produce a health check response.
fn health_check_response() -> http::Response<LfsResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(LfsResponseBody::from_static(
            r#"{"status":"running","service":"lfs"}"#,
        ))
        .expect("static health response should be valid")
}

/// Add common response headers to every LFS response.
fn add_common_headers(
    mut response: http::Response<LfsResponseBody>,
    request_id: &str,
) -> http::Response<LfsResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }

    headers
        .entry(http::header::CONTENT_TYPE)
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert(
        http::header::SERVER,
        http::HeaderValue::from_static("lfsproxy"),
    );

    response
}
