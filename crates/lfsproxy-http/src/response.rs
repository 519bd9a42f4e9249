//! LFS response serialization and error formatting.

use bytes::Bytes;
use http_body_util::Full;
use lfsproxy_model::{LfsError, LfsErrorCode};
use serde::Serialize;

use crate::body::LfsResponseBody;

/// Media type of every LFS request and response body.
pub const CONTENT_TYPE: &str = "application/vnd.git-lfs+json";

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    request_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock: Option<&'a lfsproxy_model::LockView>,
}

/// Serialize an error into its JSON body:
///
/// ```json
/// {
///   "message": "the file is already locked",
///   "request_id": "8b0c…",
///   "lock": { "id": "…", "path": "…", "locked_at": "…", "owner": { "name": "…" } }
/// }
/// ```
///
/// `lock` is only present on conflicts.
#[must_use]
pub fn error_to_json(error: &LfsError, request_id: &str) -> Vec<u8> {
    serde_json::to_vec(&ErrorBody {
        message: &error.message,
        request_id,
        lock: error.lock.as_ref(),
    })
    .expect("JSON serialization of error cannot fail")
}

/// Convert an `LfsError` into a complete HTTP error response.
///
/// 401 responses carry the Basic challenge so git prompts for credentials.
#[must_use]
pub fn error_to_response(error: &LfsError, request_id: &str) -> http::Response<LfsResponseBody> {
    let body = LfsResponseBody::Json(Full::new(Bytes::from(error_to_json(error, request_id))));

    let mut builder = http::Response::builder()
        .status(error.status_code)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header("x-request-id", request_id);
    if error.code == LfsErrorCode::Unauthorized {
        builder = builder.header(http::header::WWW_AUTHENTICATE, lfsproxy_auth::basic::challenge());
    }

    builder.body(body).expect("valid error response")
}

/// Build a JSON response with `status`.
///
/// # Errors
///
/// Returns an internal error if `value` cannot be serialized.
pub fn json_response<T: Serialize + ?Sized>(
    status: http::StatusCode,
    value: &T,
    request_id: &str,
) -> Result<http::Response<LfsResponseBody>, LfsError> {
    let body = LfsResponseBody::json(value).map_err(|e| {
        LfsError::internal_error(format!("Failed to serialize response: {e}")).with_source(e)
    })?;

    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header("x-request-id", request_id)
        .body(body)
        .map_err(|e| LfsError::internal_error(format!("Failed to build response: {e}")))
}

/// Build a bodiless response with `status`.
#[must_use]
pub fn empty_response(status: http::StatusCode, request_id: &str) -> http::Response<LfsResponseBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header("x-request-id", request_id)
        .body(LfsResponseBody::Empty)
        .expect("valid empty response")
}
