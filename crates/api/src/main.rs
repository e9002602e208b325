use std::net::SocketAddr;
use std::sync::Arc;

use stash_api::config::{ServerConfig, StorageConfig};
use stash_api::engine::{Dispatcher, JobContext};
use stash_api::router::build_app_router;
use stash_api::state::AppState;
use stash_cloud::{LocalStore, S3Config, S3Store};
use stash_core::{EventSource, ObjectStore};
use stash_line::{LineClient, LineConfig};
use stash_worker::WorkerPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stash_api=debug,stash_worker=info,stash_line=info,stash_cloud=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = config.storage.backend_name(),
        allowed_users = config.allowed_users.len(),
        "Loaded server configuration"
    );

    // --- Collaborators ---
    let source: Arc<dyn EventSource> = Arc::new(
        LineClient::new(LineConfig::new(
            config.channel_secret.clone(),
            config.channel_access_token.clone(),
        ))
        .expect("Failed to build LINE client"),
    );

    let store: Arc<dyn ObjectStore> = match &config.storage {
        StorageConfig::S3 {
            bucket,
            endpoint_url,
        } => Arc::new(
            S3Store::connect(S3Config {
                bucket: bucket.clone(),
                endpoint_url: endpoint_url.clone(),
            })
            .await,
        ),
        StorageConfig::Local { path } => {
            tracing::info!(path = %path.display(), "Using local object store");
            Arc::new(LocalStore::new(path.clone()))
        }
    };

    // --- Worker pool ---
    let pool = WorkerPool::new(config.worker_queue_capacity, config.worker_count)
        .expect("Failed to start worker pool");

    let dispatcher = Dispatcher::new(
        config.allowed_users.clone(),
        pool.submitter(),
        JobContext {
            source: Arc::clone(&source),
            store,
            key_prefix: config.object_key_prefix.clone(),
            presign_ttl: config.presign_ttl(),
        },
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        source,
        dispatcher: Arc::new(dispatcher),
    };

    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining worker pool");

    let stats = pool.close().await;
    tracing::info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        panicked = stats.panicked,
        "Graceful shutdown complete"
    );
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
