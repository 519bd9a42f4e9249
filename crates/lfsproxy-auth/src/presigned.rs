//! Presigned URL generation for AWS Signature Version 4.
//!
//! A presigned URL carries its authentication in query parameters:
//!
//! - `X-Amz-Algorithm` - always `AWS4-HMAC-SHA256`
//! - `X-Amz-Credential` - `AKID/date/region/service/aws4_request`
//! - `X-Amz-Date` - ISO 8601 basic format timestamp (`YYYYMMDDTHHMMSSZ`)
//! - `X-Amz-Expires` - validity duration in seconds
//! - `X-Amz-Security-Token` - only for temporary credentials
//! - `X-Amz-SignedHeaders` - always `host`
//! - `X-Amz-Signature` - the hex-encoded signature
//!
//! The payload hash is always `UNSIGNED-PAYLOAD`, so the holder of the URL
//! may send any body.

use chrono::{DateTime, Utc};
use http::Method;
use tracing::trace;

use crate::canonical::{canonical_query, canonical_request, canonical_uri, encode_component};
use crate::error::AuthError;
use crate::sigv4::{
    ALGORITHM, build_string_to_sign, compute_signature, credential_scope, derive_signing_key,
    hash_payload,
};

/// Payload hash used for every presigned request.
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Longest validity SigV4 accepts for a presigned URL (7 days).
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Access key pair used to sign URLs.
#[derive(Clone)]
pub struct SigningCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token of temporary credentials.
    pub session_token: Option<String>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything that identifies the request a URL is signed for.
#[derive(Debug, Clone)]
pub struct PresignRequest<'a> {
    /// HTTP method the URL is valid for.
    pub method: Method,
    /// `http` or `https`.
    pub scheme: &'a str,
    /// Host header value, including a non-default port.
    pub host: &'a str,
    /// Absolute, unencoded request path.
    pub path: &'a str,
    /// Signing region.
    pub region: &'a str,
    /// Signing service, `s3` for object stores.
    pub service: &'a str,
    /// Validity in seconds, `1..=604800`.
    pub expires_in: u64,
    /// Signing time, the start of the validity window.
    pub signed_at: DateTime<Utc>,
}

/// Produce a presigned URL for `request`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidExpiry`] if `expires_in` is zero or longer
/// than seven days.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use lfsproxy_auth::presigned::{PresignRequest, SigningCredentials, presign};
///
/// let creds = SigningCredentials {
///     access_key_id: "AKID".into(),
///     secret_access_key: "secret".into(),
///     session_token: None,
/// };
/// let url = presign(
///     &PresignRequest {
///         method: http::Method::PUT,
///         scheme: "https",
///         host: "bucket.s3.amazonaws.com",
///         path: "/ab/cd/abcd",
///         region: "us-east-1",
///         service: "s3",
///         expires_in: 3600,
///         signed_at: Utc::now(),
///     },
///     &creds,
/// )
/// .unwrap();
/// assert!(url.starts_with("https://bucket.s3.amazonaws.com/ab/cd/abcd?X-Amz-Algorithm="));
/// ```
pub fn presign(
    request: &PresignRequest<'_>,
    credentials: &SigningCredentials,
) -> Result<String, AuthError> {
    if request.expires_in == 0 || request.expires_in > MAX_PRESIGN_EXPIRY_SECS {
        return Err(AuthError::InvalidExpiry(request.expires_in));
    }

    let timestamp = request.signed_at.format("%Y%m%dT%H%M%SZ").to_string();
    let date = request.signed_at.format("%Y%m%d").to_string();
    let scope = credential_scope(&date, request.region, request.service);

    let mut params = vec![
        ("X-Amz-Algorithm", ALGORITHM.to_owned()),
        (
            "X-Amz-Credential",
            encode_component(&format!("{}/{scope}", credentials.access_key_id)),
        ),
        ("X-Amz-Date", timestamp.clone()),
        ("X-Amz-Expires", request.expires_in.to_string()),
        ("X-Amz-SignedHeaders", "host".to_owned()),
    ];
    if let Some(token) = &credentials.session_token {
        params.push(("X-Amz-Security-Token", encode_component(token)));
    }

    let query = canonical_query(&params);
    let uri = canonical_uri(request.path);
    let host = request.host.to_ascii_lowercase();
    let canonical_request =
        canonical_request(request.method.as_str(), &uri, &query, &host, UNSIGNED_PAYLOAD);
    trace!(canonical_request, "built presign canonical request");

    let string_to_sign = build_string_to_sign(
        &timestamp,
        &scope,
        &hash_payload(canonical_request.as_bytes()),
    );
    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &date,
        request.region,
        request.service,
    );
    let signature = compute_signature(&signing_key, &string_to_sign);

    Ok(format!(
        "{}://{host}{uri}?{query}&X-Amz-Signature={signature}",
        request.scheme
    ))
}
