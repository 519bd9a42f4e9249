//! HTTP Basic `Authorization` header parsing (RFC 7617).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::AuthError;

/// Realm announced in the `WWW-Authenticate` challenge.
pub const BASIC_REALM: &str = "Git LFS Server";

/// Username and password decoded from a Basic credential.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// The user name (before the first `:`).
    pub username: String,
    /// The password (everything after the first `:`).
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Value of the `WWW-Authenticate` header sent with 401 responses.
#[must_use]
pub fn challenge() -> String {
    format!("Basic realm=\"{BASIC_REALM}\"")
}

/// Parse an `Authorization` header value of the form `Basic <base64>`.
///
/// The scheme name is matched case-insensitively.
///
/// # Errors
///
/// Returns [`AuthError::MalformedAuthorization`] if the scheme is not
/// `Basic`, the payload is not valid base64 or UTF-8, or it lacks a `:`.
///
/// # Examples
///
/// ```
/// use lfsproxy_auth::basic::parse_basic_authorization;
///
/// let creds = parse_basic_authorization("Basic Ym9iOnB3OmQ=").unwrap();
/// assert_eq!(creds.username, "bob");
/// assert_eq!(creds.password, "pw:d");
/// ```
pub fn parse_basic_authorization(header: &str) -> Result<BasicCredentials, AuthError> {
    let (scheme, payload) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::MalformedAuthorization("missing scheme".to_owned()))?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::MalformedAuthorization(format!(
            "unsupported scheme {scheme}"
        )));
    }

    let decoded = BASE64
        .decode(payload.trim())
        .map_err(|e| AuthError::MalformedAuthorization(e.to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AuthError::MalformedAuthorization("credential is not UTF-8".to_owned()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AuthError::MalformedAuthorization("missing ':' separator".to_owned()))?;

    Ok(BasicCredentials {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        format!("Basic {}", BASE64.encode(raw))
    }

    #[test]
    fn test_should_parse_basic_credentials() {
        let creds = parse_basic_authorization(&encode("alice:s3cret")).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_should_accept_lowercase_scheme() {
        let header = format!("basic {}", BASE64.encode("alice:x"));
        assert!(parse_basic_authorization(&header).is_ok());
    }

    #[test]
    fn test_should_keep_colons_in_password() {
        let creds = parse_basic_authorization(&encode("alice:a:b:c")).unwrap();
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_should_reject_other_schemes() {
        let result = parse_basic_authorization("Bearer abc.def");
        assert!(matches!(result, Err(AuthError::MalformedAuthorization(_))));
    }

    #[test]
    fn test_should_reject_invalid_base64() {
        assert!(parse_basic_authorization("Basic !!!").is_err());
    }

    #[test]
    fn test_should_reject_payload_without_separator() {
        assert!(parse_basic_authorization(&encode("alice")).is_err());
    }

    #[test]
    fn test_should_redact_password_in_debug_output() {
        let creds = parse_basic_authorization(&encode("alice:hunter2")).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_should_build_challenge_header() {
        assert_eq!(challenge(), "Basic realm=\"Git LFS Server\"");
    }
}
