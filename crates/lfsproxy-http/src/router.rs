//! LFS request router.
//!
//! ```text
//! GET  /health | /_health
//! POST /lfs/{owner}/{repo}/objects/batch
//! POST /lfs/{owner}/{repo}/objects/verify
//! GET  /lfs/{owner}/{repo}/locks
//! POST /lfs/{owner}/{repo}/locks
//! POST /lfs/{owner}/{repo}/locks/verify
//! POST /lfs/{owner}/{repo}/locks/{id}/unlock
//! ```
//!
//! All of the above may sit below a configured base path.

use http::Method;
use lfsproxy_model::{LfsError, LfsOperation};

/// A request matched to an LFS operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRequest {
    /// Resolved operation.
    pub operation: LfsOperation,
    /// First repository segment.
    pub owner: String,
    /// Second repository segment.
    pub repo: String,
    /// Lock id segment of the unlock route.
    pub lock_id: Option<String>,
}

/// Outcome of routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Liveness probe, served without authentication.
    Health,
    /// An LFS API call.
    Lfs(RoutedRequest),
}

/// Resolve `method` and `path` (without query) to a [`Route`].
///
/// `base_path` is `""` or `/segment[/segment...]`; paths outside it do not
/// exist.
///
/// # Errors
///
/// 404 for unknown paths, 405 for a known path with the wrong method.
pub fn resolve_route(method: &Method, path: &str, base_path: &str) -> Result<Route, LfsError> {
    let not_found = || LfsError::not_found(format!("No route for {path}"));

    let rest = if base_path.is_empty() {
        path
    } else {
        match path.strip_prefix(base_path) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => return Err(not_found()),
        }
    };

    let rest = rest.strip_suffix('/').filter(|r| !r.is_empty()).unwrap_or(rest);
    let segments: Vec<&str> = rest.split('/').skip(1).collect();

    let (operation, allowed, lock_id) = match segments.as_slice() {
        ["health" | "_health"] => {
            return if *method == Method::GET {
                Ok(Route::Health)
            } else {
                Err(LfsError::method_not_allowed(method))
            };
        }
        ["lfs", _, _, "objects", "batch"] => (LfsOperation::Batch, Method::POST, None),
        ["lfs", _, _, "objects", "verify"] => (LfsOperation::VerifyObject, Method::POST, None),
        ["lfs", _, _, "locks"] => {
            let op = match *method {
                Method::GET => LfsOperation::ListLocks,
                Method::POST => LfsOperation::CreateLock,
                _ => return Err(LfsError::method_not_allowed(method)),
            };
            (op, method.clone(), None)
        }
        ["lfs", _, _, "locks", "verify"] => (LfsOperation::VerifyLocks, Method::POST, None),
        ["lfs", _, _, "locks", id, "unlock"] if !id.is_empty() => {
            (LfsOperation::Unlock, Method::POST, Some((*id).to_owned()))
        }
        _ => return Err(not_found()),
    };

    if *method != allowed {
        return Err(LfsError::method_not_allowed(method));
    }

    Ok(Route::Lfs(RoutedRequest {
        operation,
        owner: segments[1].to_owned(),
        repo: segments[2].to_owned(),
        lock_id,
    }))
}

/// Extract the `path` and `id` lock filters from a query string.
#[must_use]
pub fn lock_filters(query: Option<&str>) -> (Option<String>, Option<String>) {
    let mut path = None;
    let mut id = None;
    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "path" => path = Some(value.into_owned()),
            "id" => id = Some(value.into_owned()),
            _ => {}
        }
    }
    (path, id)
}
