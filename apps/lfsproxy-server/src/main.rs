//! lfsproxy server: a Git LFS endpoint in front of an S3-compatible bucket.
//!
//! Clients talk the Git LFS batch and locking APIs to this server; object
//! data goes straight to the bucket through presigned URLs. Locks are kept in
//! one JSON file per repository below `LFS_LOCK_DIR`.
//!
//! # Usage
//!
//! ```text
//! S3_BUCKET=lfs S3_ACCESS_KEY=... S3_SECRET_KEY=... \
//! LFS_USERS=alice:secret GATEWAY_LISTEN=0.0.0.0:8080 lfsproxy-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `LFS_BASE_PATH` | *(empty)* | Path prefix stripped before routing |
//! | `LFS_PUBLIC_URL` | *(unset)* | External URL used for verify callbacks |
//! | `LFS_LOCK_DIR` | `./lfs-locks` | Lock file directory |
//! | `LFS_PRESIGNED_URL_EXPIRY` | `3600` | Action lifetime in seconds |
//! | `LFS_BATCH_CONCURRENCY` | `64` | Objects of one batch resolved concurrently |
//! | `LFS_USERS` | *(empty)* | `name:password[:id]`, comma separated |
//! | `S3_*` | | Storage settings, see `lfsproxy-storage` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use lfsproxy_auth::{StaticUserProvider, UserProvider};
use lfsproxy_core::LfsProxyConfig;
use lfsproxy_http::{LfsHandler, LfsHttpConfig, LfsHttpService};
use lfsproxy_locks::JsonFileLockStore;
use lfsproxy_service::{LfsProxyHandler, LfsProxyProvider};
use lfsproxy_storage::{ObjectStore, S3ObjectStore, S3StoreConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`LfsHttpConfig`] from the application config.
fn build_http_config(config: &LfsProxyConfig, users: Arc<dyn UserProvider>) -> LfsHttpConfig {
    LfsHttpConfig {
        base_path: config.base_path.clone(),
        public_url: config.public_url.clone(),
        users,
    }
}

/// Load the account list from `LFS_USERS`.
fn build_user_provider() -> Result<Arc<dyn UserProvider>> {
    let users = StaticUserProvider::from_env().context("invalid LFS_USERS")?;
    if users.is_empty() {
        warn!("no users configured, every LFS request will be rejected");
    } else {
        info!(count = users.len(), "configured users");
    }
    Ok(Arc::new(users))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<H: LfsHandler>(listener: TcpListener, service: LfsHttpService<H>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request the health endpoint of a running server over plain HTTP/1.1.
async fn run_health_check(addr: &str, base_path: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET {base_path}/health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = LfsProxyConfig::from_env();
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr, &config.base_path).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = LfsProxyConfig::from_env();

    init_tracing(&config.log_level)?;
    config.validate().context("invalid configuration")?;

    let store_config = S3StoreConfig::from_env();
    info!(
        gateway_listen = %config.gateway_listen,
        base_path = %config.base_path,
        public_url = ?config.public_url,
        lock_dir = %config.lock_dir,
        bucket = %store_config.bucket,
        endpoint = ?store_config.endpoint,
        version = VERSION,
        "starting lfsproxy server",
    );

    let users = build_user_provider()?;
    let resolver = store_config.key_resolver();
    let objects = S3ObjectStore::new(store_config).context("invalid storage configuration")?;

    if let Err(e) = objects.check_ready().await {
        error!(bucket = %objects.bucket(), error = %e, "object storage is not reachable");
        std::process::exit(1);
    }
    info!(bucket = %objects.bucket(), "object storage is reachable");

    let provider = LfsProxyProvider::new(
        &config,
        Arc::new(objects),
        resolver,
        Arc::new(JsonFileLockStore::new(&config.lock_dir)),
    );
    let handler = Arc::new(LfsProxyHandler::new(Arc::new(provider)));
    let service = LfsHttpService::new(handler, build_http_config(&config, users));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
