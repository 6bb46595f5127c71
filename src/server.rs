// src/server.rs

//! HTTP server lifecycle: bind, serve, flush on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::api::{AppState, router};
use crate::error::Result;
use crate::models::Config;
use crate::services::NoticeSource;
use crate::storage::NoticeStore;

/// Serve the API until SIGINT/SIGTERM, then flush the store.
pub async fn serve(
    config: &Config,
    store: Arc<NoticeStore>,
    source: Arc<dyn NoticeSource>,
) -> Result<()> {
    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Server running at http://{}", listener.local_addr()?);
    log::info!("Storage: {}", store.location().display());

    let state = AppState::new(Arc::clone(&store), source, config.service.name.clone());
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let timeout = Duration::from_secs(config.storage.shutdown_flush_timeout_secs);
    store.shutdown(timeout).await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl-C"),
        _ = terminate => log::info!("Received SIGTERM"),
    }
}
