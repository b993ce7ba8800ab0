//! Triage API server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::triage_router;
use crate::pipeline::triage::TriagePipeline;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind triage API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to get server address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Handle to a running triage API server.
pub struct TriageServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TriageServer {
    /// Send the graceful shutdown signal. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Triage API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish (after `shutdown`).
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Triage API server task failed: {e}");
            }
        }
    }
}

/// Start the triage API server on `addr` (port 0 picks an ephemeral port).
///
/// Returns once the listener is bound; requests are served from a
/// background tokio task until `TriageServer::shutdown` is called.
pub async fn start_server_on(
    pipeline: Arc<TriagePipeline>,
    addr: SocketAddr,
) -> Result<TriageServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = triage_router(pipeline);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Triage API server received shutdown signal");
        };

        tracing::info!(%addr, "Triage API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Triage API server error: {e}");
        }

        tracing::info!("Triage API server stopped");
    });

    Ok(TriageServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
