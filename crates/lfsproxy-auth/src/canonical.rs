//! Canonical request construction for presigned SigV4 URLs.
//!
//! A presigned URL signs only the `host` header and never the payload, so
//! the canonical request always has this shape:
//!
//! ```text
//! METHOD\n
//! /uri-encoded/path\n
//! sorted=query&string=...\n
//! host:<host>\n
//! \n
//! host\n
//! UNSIGNED-PAYLOAD
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything outside the RFC 3986 unreserved set (`A-Z`, `a-z`, `0-9`,
/// `-`, `_`, `.`, `~`) is percent-encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a path segment or query component with the SigV4 rules.
///
/// ```
/// use lfsproxy_auth::canonical::encode_component;
///
/// assert_eq!(encode_component("a/b c"), "a%2Fb%20c");
/// ```
#[must_use]
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Encode every segment of `path`, keeping the `/` separators.
///
/// An empty path becomes `/`. Segments are decoded first, so an already
/// encoded path comes out unchanged.
///
/// ```
/// use lfsproxy_auth::canonical::canonical_uri;
///
/// assert_eq!(canonical_uri("/alice/game/ab/cd/abcd"), "/alice/game/ab/cd/abcd");
/// assert_eq!(canonical_uri(""), "/");
/// ```
#[must_use]
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| encode_component(&percent_decode_str(segment).decode_utf8_lossy()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Join already encoded query parameters, sorted by name then value.
#[must_use]
pub fn canonical_query(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_unstable();

    sorted
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical request of a presigned URL.
///
/// `uri` and `query` must already be canonical; `host` is lowercased.
#[must_use]
pub fn canonical_request(method: &str, uri: &str, query: &str, host: &str, payload_hash: &str) -> String {
    let host = host.to_ascii_lowercase();
    format!("{method}\n{uri}\n{query}\nhost:{host}\n\nhost\n{payload_hash}")
}
