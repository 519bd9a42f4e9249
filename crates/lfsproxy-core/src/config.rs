//! Configuration management for lfsproxy.
//!
//! All configuration is driven by environment variables. Storage backend
//! settings live next to the backend in `lfsproxy-storage`; this module holds
//! the settings of the server and of the LFS protocol layer.

use serde::{Deserialize, Serialize};
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::error::LfsProxyError;

/// Longest lifetime SigV4 allows for a presigned URL (7 days).
const MAX_PRESIGNED_URL_EXPIRY: u64 = 604_800;

/// Global configuration for lfsproxy.
///
/// # Examples
///
/// ```
/// use lfsproxy_core::LfsProxyConfig;
///
/// let config = LfsProxyConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.presigned_url_expiry_secs, 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct LfsProxyConfig {
    /// Bind address for the HTTP listener.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Path prefix the server is mounted under behind a reverse proxy
    /// (normalized to `""` or `/segment[/segment...]`).
    #[builder(default)]
    pub base_path: String,

    /// Externally visible base URL used for verify callbacks.
    #[builder(default)]
    pub public_url: Option<String>,

    /// Directory holding one JSON lock file per repository.
    #[builder(default = String::from("./lfs-locks"))]
    pub lock_dir: String,

    /// Lifetime stamped onto every action (seconds).
    #[builder(default = 3600)]
    pub presigned_url_expiry_secs: u64,

    /// Maximum number of objects of one batch resolved at the same time.
    #[builder(default = 64)]
    pub batch_concurrency: usize,
}

impl Default for LfsProxyConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:8080"),
            log_level: String::from("info"),
            base_path: String::new(),
            public_url: None,
            lock_dir: String::from("./lfs-locks"),
            presigned_url_expiry_secs: 3600,
            batch_concurrency: 64,
        }
    }
}

impl LfsProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `LFS_BASE_PATH` | *(empty)* |
    /// | `LFS_PUBLIC_URL` | *(unset)* |
    /// | `LFS_LOCK_DIR` | `./lfs-locks` |
    /// | `LFS_PRESIGNED_URL_EXPIRY` | `3600` |
    /// | `LFS_BATCH_CONCURRENCY` | `64` |
    ///
    /// Unparseable numbers are logged and replaced by their default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("LFS_BASE_PATH") {
            config.base_path = normalize_base_path(&v);
        }
        if let Ok(v) = std::env::var("LFS_PUBLIC_URL") {
            let v = v.trim().trim_end_matches('/');
            if !v.is_empty() {
                config.public_url = Some(v.to_owned());
            }
        }
        if let Ok(v) = std::env::var("LFS_LOCK_DIR") {
            config.lock_dir = v;
        }
        if let Ok(v) = std::env::var("LFS_PRESIGNED_URL_EXPIRY") {
            match v.parse::<u64>() {
                Ok(n) => config.presigned_url_expiry_secs = n,
                Err(e) => warn!(value = %v, error = %e, "ignoring invalid LFS_PRESIGNED_URL_EXPIRY"),
            }
        }
        if let Ok(v) = std::env::var("LFS_BATCH_CONCURRENCY") {
            match v.parse::<usize>() {
                Ok(n) => config.batch_concurrency = n,
                Err(e) => warn!(value = %v, error = %e, "ignoring invalid LFS_BATCH_CONCURRENCY"),
            }
        }

        config
    }

    /// Check value ranges that cannot be expressed in the types.
    ///
    /// # Errors
    /// Returns [`LfsProxyError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), LfsProxyError> {
        if self.presigned_url_expiry_secs == 0
            || self.presigned_url_expiry_secs > MAX_PRESIGNED_URL_EXPIRY
        {
            return Err(LfsProxyError::Config(format!(
                "presigned URL expiry must be between 1 and {MAX_PRESIGNED_URL_EXPIRY} seconds, got {}",
                self.presigned_url_expiry_secs
            )));
        }
        if self.batch_concurrency == 0 {
            return Err(LfsProxyError::Config(
                "batch concurrency must be at least 1".to_owned(),
            ));
        }
        if let Some(url) = &self.public_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(LfsProxyError::Config(format!(
                    "public URL must start with http:// or https://, got {url}"
                )));
            }
        }
        if self.lock_dir.is_empty() {
            return Err(LfsProxyError::Config(
                "lock directory must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Normalize a base path to `""` or `/a/b` (leading slash, no trailing slash).
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Parse a string as a boolean, accepting `"1"`, `"true"` and `"yes"`
/// (case-insensitive).
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}
