use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::api::{self, AppState};
use super::db::{DbHandle, SyncDb};
use super::signature::SignatureVerifier;
use crate::config::SyncConfig;

/// Build the full application router with request tracing and a deadline.
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    api::api_router()
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Open the store at the configured path, creating its directory.
pub fn open_database(config: &SyncConfig) -> Result<SyncDb> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    SyncDb::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Start the webhook server and block until shutdown.
pub async fn start_server(config: SyncConfig) -> Result<()> {
    for warning in config.validate()? {
        warn!("{}", warning);
    }

    let db = open_database(&config)?;
    let state = Arc::new(AppState {
        db: DbHandle::new(db),
        verifier: SignatureVerifier::new(config.webhook.secret.as_bytes()),
        max_body_bytes: config.webhook.max_body_bytes,
    });

    let app = build_router(state, config.request_timeout());

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        db = %config.database.path.display(),
        "Webhook server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down...");
}
