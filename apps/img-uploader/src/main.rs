//! img-uploader server
//!
//! Accepts image uploads, stores each distinct image once in an
//! S3-compatible bucket and serves a page for it at `/{sha1}`.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use img_uploader::config::{Config, StorageBackend};
use img_uploader::gateway::DedupGateway;
use img_uploader::routes;
use img_uploader::state::AppState;
use img_uploader::storage::{InMemoryStore, ObjectStore, S3Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "img_uploader=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("Starting img-uploader v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn ObjectStore> = match &config.storage {
        StorageBackend::S3(storage) => {
            tracing::info!("S3 endpoint: {}", storage.endpoint);
            let client = S3Client::new(storage)
                .await
                .context("Failed to initialize S3 client")?;
            tracing::info!("S3 bucket: {}", client.bucket());
            Arc::new(client)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; images are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, DedupGateway::new(store));
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("img-uploader is now listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
