//! Integration tests for the lfsproxy server.
//!
//! These tests require a running server at `localhost:8080` with a reachable
//! bucket and two configured users. They are marked `#[ignore]` so they don't
//! run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! LFS_USERS=alice:secret,bob:secret cargo run -p lfsproxy-server &
//! cargo test -p lfsproxy-integration -- --ignored
//! ```
//!
//! | Variable | Default |
//! |----------|---------|
//! | `LFS_ENDPOINT_URL` | `http://localhost:8080` |
//! | `LFS_TEST_USER` / `LFS_TEST_PASSWORD` | `alice` / `secret` |
//! | `LFS_TEST_OTHER_USER` / `LFS_TEST_OTHER_PASSWORD` | `bob` / `secret` |

use std::sync::Once;

use serde::Serialize;
use sha2::{Digest, Sha256};

static INIT: Once = Once::new();

/// Media type of LFS request and response bodies.
pub const LFS_CONTENT_TYPE: &str = "application/vnd.git-lfs+json";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Endpoint URL for the server, including any base path.
#[must_use]
pub fn endpoint_url() -> String {
    env_or("LFS_ENDPOINT_URL", "http://localhost:8080")
}

/// Credentials of a configured user.
#[derive(Debug, Clone)]
pub struct TestUser {
    /// User name.
    pub name: String,
    /// Password.
    pub password: String,
}

/// The primary test user.
#[must_use]
pub fn alice() -> TestUser {
    TestUser {
        name: env_or("LFS_TEST_USER", "alice"),
        password: env_or("LFS_TEST_PASSWORD", "secret"),
    }
}

/// A second user, for ownership checks.
#[must_use]
pub fn bob() -> TestUser {
    TestUser {
        name: env_or("LFS_TEST_OTHER_USER", "bob"),
        password: env_or("LFS_TEST_OTHER_PASSWORD", "secret"),
    }
}

/// LFS client for one user.
#[derive(Debug, Clone)]
pub struct LfsClient {
    http: reqwest::Client,
    base: String,
    user: TestUser,
}

impl LfsClient {
    /// Client for `user` against [`endpoint_url`].
    #[must_use]
    pub fn new(user: TestUser) -> Self {
        init_tracing();
        Self {
            http: reqwest::Client::new(),
            base: endpoint_url(),
            user,
        }
    }

    /// The underlying HTTP client, for presigned URLs.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL of `path` on the server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Authenticated `GET`.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(self.url(path))
            .basic_auth(&self.user.name, Some(&self.user.password))
            .header("accept", LFS_CONTENT_TYPE)
            .send()
            .await
            .expect("request should be sent")
    }

    /// Authenticated `POST` of a JSON body.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .basic_auth(&self.user.name, Some(&self.user.password))
            .header("accept", LFS_CONTENT_TYPE)
            .header("content-type", LFS_CONTENT_TYPE)
            .body(serde_json::to_vec(body).expect("body should serialize"))
            .send()
            .await
            .expect("request should be sent")
    }
}

/// A repository path unique to one test, e.g. `/lfs/it/batch-1a2b3c4d`.
#[must_use]
pub fn test_repo(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("/lfs/it/{prefix}-{id}")
}

/// Random content and its LFS object id.
#[must_use]
pub fn random_object(len: usize) -> (Vec<u8>, String) {
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        data.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    }
    data.truncate(len);
    let oid = hex::encode(Sha256::digest(&data));
    (data, oid)
}

mod test_batch;
mod test_health;
mod test_locks;
