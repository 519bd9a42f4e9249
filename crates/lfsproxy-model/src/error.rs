//! Request-level error type.
//!
//! Every failure that ends a request is rendered as
//! `{"message": …, "request_id": …}`, plus the conflicting lock for 409.

use std::fmt;

use crate::lock::LockView;

/// Request-level error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum LfsErrorCode {
    /// Malformed body or invalid repository name.
    #[default]
    BadRequest,
    /// Missing or wrong credentials.
    Unauthorized,
    /// Caller may not touch the resource.
    Forbidden,
    /// Unknown route, object or lock.
    NotFound,
    /// Known route, wrong method.
    MethodNotAllowed,
    /// Path already locked.
    Conflict,
    /// Well-formed but unacceptable input.
    UnprocessableEntity,
    /// Backend or store failure.
    InternalError,
    /// Server cannot serve requests as configured.
    NotConfigured,
}

impl LfsErrorCode {
    /// Returns the short error code string used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::Conflict => "Conflict",
            Self::UnprocessableEntity => "UnprocessableEntity",
            Self::InternalError => "InternalError",
            Self::NotConfigured => "NotConfigured",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::BadRequest => http::StatusCode::BAD_REQUEST,
            Self::Unauthorized => http::StatusCode::UNAUTHORIZED,
            Self::Forbidden => http::StatusCode::FORBIDDEN,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict => http::StatusCode::CONFLICT,
            Self::UnprocessableEntity => http::StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError | Self::NotConfigured => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for LfsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error response of the LFS API.
#[derive(Debug)]
pub struct LfsError {
    /// The error code.
    pub code: LfsErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// Existing lock, attached to conflicts.
    pub lock: Option<LockView>,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for LfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LfsError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for LfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl LfsError {
    /// Create a new `LfsError` with a custom message.
    #[must_use]
    pub fn with_message(code: LfsErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            lock: None,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Malformed request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(LfsErrorCode::BadRequest, message)
    }

    /// Missing or wrong credentials.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::with_message(LfsErrorCode::Unauthorized, "Credentials needed")
    }

    /// Caller is not allowed to act on the resource.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_message(LfsErrorCode::Forbidden, message)
    }

    /// Resource not found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(LfsErrorCode::NotFound, message)
    }

    /// Wrong HTTP method for a known route.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method) -> Self {
        Self::with_message(
            LfsErrorCode::MethodNotAllowed,
            format!("Method {method} is not allowed for this resource"),
        )
    }

    /// Path is already locked by `existing`.
    #[must_use]
    pub fn lock_conflict(existing: LockView) -> Self {
        let mut err = Self::with_message(LfsErrorCode::Conflict, "the file is already locked");
        err.lock = Some(existing);
        err
    }

    /// Input that is well-formed but not acceptable.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::with_message(LfsErrorCode::UnprocessableEntity, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(LfsErrorCode::InternalError, message)
    }

    /// No user accounts configured.
    #[must_use]
    pub fn not_configured() -> Self {
        Self::with_message(
            LfsErrorCode::NotConfigured,
            "Authentication is not configured on the server.",
        )
    }
}
