//! S3-compatible object store adapter.
//!
//! Nothing here links an AWS SDK. Every request the proxy itself makes (HEAD
//! on an object or the bucket) is sent with `reqwest` to a short-lived SigV4
//! presigned URL, and the URLs handed to clients are produced the same way.
//! Both virtual-hosted (`https://bucket.host/key`) and path-style
//! (`http://host:9000/bucket/key`, typical for MinIO) addressing are
//! supported.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use http::{Method, StatusCode};
use lfsproxy_auth::{PresignRequest, SigningCredentials, presign};
use lfsproxy_core::parse_bool;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::backend::{ObjectStatus, ObjectStore};
use crate::error::StorageError;
use crate::key::ObjectKeyResolver;

/// Lifetime of the URLs the adapter signs for its own HEAD requests.
const HEAD_URL_TTL_SECS: u64 = 60;

/// Connection settings of the S3 adapter.
///
/// # Examples
///
/// ```
/// use lfsproxy_storage::S3StoreConfig;
///
/// let config = S3StoreConfig::builder()
///     .bucket("lfs".into())
///     .access_key_id("minio".into())
///     .secret_access_key("minio123".into())
///     .endpoint(Some("http://localhost:9000".into()))
///     .force_path_style(true)
///     .build();
/// assert_eq!(config.region, "us-east-1");
/// assert!(config.per_repo_storage);
/// ```
#[derive(Clone, TypedBuilder)]
pub struct S3StoreConfig {
    /// Endpoint URL. Defaults to `https://s3.{region}.amazonaws.com`.
    #[builder(default)]
    pub endpoint: Option<String>,

    /// Signing region.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Bucket holding all objects.
    pub bucket: String,

    /// Access key id.
    pub access_key_id: String,

    /// Secret access key.
    pub secret_access_key: String,

    /// Session token for temporary credentials.
    #[builder(default)]
    pub session_token: Option<String>,

    /// Prefix put in front of every object key.
    #[builder(default)]
    pub root_path_prefix: String,

    /// Whether object keys are partitioned by repository.
    #[builder(default = true)]
    pub per_repo_storage: bool,

    /// Use path-style instead of virtual-hosted-style addressing.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Timeout for requests the adapter sends itself (seconds).
    #[builder(default = 30)]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for S3StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("root_path_prefix", &self.root_path_prefix)
            .field("per_repo_storage", &self.per_repo_storage)
            .field("force_path_style", &self.force_path_style)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl S3StoreConfig {
    /// Load settings from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_ENDPOINT` | `https://s3.{region}.amazonaws.com` |
    /// | `S3_REGION` / `AWS_REGION` | `us-east-1` |
    /// | `S3_BUCKET` | *(required)* |
    /// | `S3_ACCESS_KEY` / `AWS_ACCESS_KEY_ID` | *(required)* |
    /// | `S3_SECRET_KEY` / `AWS_SECRET_ACCESS_KEY` | *(required)* |
    /// | `S3_SESSION_TOKEN` / `AWS_SESSION_TOKEN` | *(unset)* |
    /// | `S3_ROOT_PATH_PREFIX` | *(empty)* |
    /// | `S3_PER_REPO_STORAGE` | `true` |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `S3_REQUEST_TIMEOUT` | `30` |
    ///
    /// Missing required values are left empty and rejected by
    /// [`S3ObjectStore::new`].
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::builder()
            .bucket(env_any(&["S3_BUCKET"]).unwrap_or_default())
            .access_key_id(env_any(&["S3_ACCESS_KEY", "AWS_ACCESS_KEY_ID"]).unwrap_or_default())
            .secret_access_key(
                env_any(&["S3_SECRET_KEY", "AWS_SECRET_ACCESS_KEY"]).unwrap_or_default(),
            )
            .endpoint(env_any(&["S3_ENDPOINT"]))
            .session_token(env_any(&["S3_SESSION_TOKEN", "AWS_SESSION_TOKEN"]))
            .build();

        if let Some(v) = env_any(&["S3_REGION", "AWS_REGION"]) {
            config.region = v;
        }
        if let Some(v) = env_any(&["S3_ROOT_PATH_PREFIX"]) {
            config.root_path_prefix = v;
        }
        if let Some(v) = env_any(&["S3_PER_REPO_STORAGE"]) {
            config.per_repo_storage = parse_bool(&v);
        }
        if let Some(v) = env_any(&["S3_FORCE_PATH_STYLE"]) {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(v) = env_any(&["S3_REQUEST_TIMEOUT"]) {
            match v.parse::<u64>() {
                Ok(n) => config.request_timeout_secs = n,
                Err(e) => warn!(value = %v, error = %e, "ignoring invalid S3_REQUEST_TIMEOUT"),
            }
        }

        config
    }

    /// Key resolver matching the configured key layout.
    #[must_use]
    pub fn key_resolver(&self) -> ObjectKeyResolver {
        ObjectKeyResolver::new(&self.root_path_prefix, self.per_repo_storage)
    }
}

/// First non-empty value among `names`.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_owned())
        .find(|v| !v.is_empty())
}

/// Scheme and canonical host (`host[:port]`, default port stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    scheme: String,
    host: String,
}

impl Endpoint {
    fn parse(raw: &str) -> Result<Self, StorageError> {
        let uri: http::Uri = raw
            .trim()
            .trim_end_matches('/')
            .parse()
            .map_err(|e| StorageError::Config(format!("invalid S3 endpoint {raw:?}: {e}")))?;

        let scheme = match uri.scheme_str() {
            Some(s @ ("http" | "https")) => s.to_owned(),
            _ => {
                return Err(StorageError::Config(format!(
                    "S3 endpoint {raw:?} must start with http:// or https://"
                )));
            }
        };
        let authority = uri
            .authority()
            .ok_or_else(|| StorageError::Config(format!("S3 endpoint {raw:?} has no host")))?;
        if !matches!(uri.path(), "" | "/") {
            return Err(StorageError::Config(format!(
                "S3 endpoint {raw:?} must not contain a path"
            )));
        }

        let host = authority.host().to_ascii_lowercase();
        let host = match (scheme.as_str(), authority.port_u16()) {
            (_, None) | ("http", Some(80)) | ("https", Some(443)) => host,
            (_, Some(port)) => format!("{host}:{port}"),
        };
        Ok(Self { scheme, host })
    }
}

/// [`ObjectStore`] backed by an S3-compatible service.
#[derive(Debug)]
pub struct S3ObjectStore {
    bucket: String,
    region: String,
    force_path_style: bool,
    endpoint: Endpoint,
    credentials: SigningCredentials,
    client: reqwest::Client,
}

impl S3ObjectStore {
    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the bucket or credentials are
    /// missing, the endpoint is malformed, or the HTTP client cannot be
    /// built.
    pub fn new(config: S3StoreConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::Config("S3_BUCKET is required".to_owned()));
        }
        if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
            return Err(StorageError::Config(
                "S3 access key and secret key are required".to_owned(),
            ));
        }
        if config.request_timeout_secs == 0 {
            return Err(StorageError::Config(
                "S3 request timeout must be at least 1 second".to_owned(),
            ));
        }

        let endpoint = match &config.endpoint {
            Some(raw) => Endpoint::parse(raw)?,
            None => Endpoint::parse(&format!("https://s3.{}.amazonaws.com", config.region))?,
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        debug!(
            bucket = %config.bucket,
            host = %endpoint.host,
            path_style = config.force_path_style,
            "S3 object store configured"
        );

        Ok(Self {
            bucket: config.bucket,
            region: config.region,
            force_path_style: config.force_path_style,
            endpoint,
            credentials: SigningCredentials {
                access_key_id: config.access_key_id,
                secret_access_key: config.secret_access_key,
                session_token: config.session_token,
            },
            client,
        })
    }

    /// The configured bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Host and path of an object, or of the bucket when `key` is `None`.
    fn address(&self, key: Option<&str>) -> (String, String) {
        if self.force_path_style {
            let path = match key {
                Some(key) => format!("/{}/{key}", self.bucket),
                None => format!("/{}", self.bucket),
            };
            (self.endpoint.host.clone(), path)
        } else {
            let path = key.map_or_else(|| "/".to_owned(), |key| format!("/{key}"));
            (format!("{}.{}", self.bucket, self.endpoint.host), path)
        }
    }

    fn sign(&self, method: Method, key: Option<&str>, ttl_secs: u64) -> Result<String, StorageError> {
        let (host, path) = self.address(key);
        let url = presign(
            &PresignRequest {
                method,
                scheme: &self.endpoint.scheme,
                host: &host,
                path: &path,
                region: &self.region,
                service: "s3",
                expires_in: ttl_secs,
                signed_at: Utc::now(),
            },
            &self.credentials,
        )?;
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head(&self, key: &str) -> Result<ObjectStatus, StorageError> {
        let url = self.sign(Method::HEAD, Some(key), HEAD_URL_TTL_SECS)?;
        let response = self.client.head(&url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let size = response
                    .headers()
                    .get(http::header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| StorageError::MissingContentLength(key.to_owned()))?;
                debug!(key, size, "object present");
                Ok(ObjectStatus::Present { size })
            }
            StatusCode::NOT_FOUND => {
                debug!(key, "object absent");
                Ok(ObjectStatus::Absent)
            }
            status => Err(StorageError::UnexpectedStatus {
                target: key.to_owned(),
                status: status.as_u16(),
            }),
        }
    }

    fn presign_upload(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        self.sign(Method::PUT, Some(key), ttl_secs)
    }

    fn presign_download(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        self.sign(Method::GET, Some(key), ttl_secs)
    }

    async fn check_ready(&self) -> Result<(), StorageError> {
        let url = self.sign(Method::HEAD, None, HEAD_URL_TTL_SECS)?;
        let response = self.client.head(&url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::UnexpectedStatus {
                target: self.bucket.clone(),
                status: response.status().as_u16(),
            })
        }
    }
}
