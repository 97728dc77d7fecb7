//! Metrics HTTP Server
//!
//! Serves the Prometheus text exposition on a dedicated port, separate from
//! the main API traffic. No authentication; scrapes are read-only.

use super::MetricsExporter;
use crate::Result;
use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

/// HTTP server for Prometheus scraping.
pub struct MetricsServer {
    exporter: Arc<MetricsExporter>,
    bind_addr: SocketAddr,
}

impl MetricsServer {
    /// Create a new metrics server.
    pub fn new(exporter: Arc<MetricsExporter>, bind_addr: SocketAddr) -> Self {
        Self {
            exporter,
            bind_addr,
        }
    }

    /// Build the scrape router (`/metrics` and `/health`).
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(serve_metrics))
            .route("/health", get(health_check))
            .with_state(self.exporter.clone())
    }

    /// Serve until the shutdown signal arrives.
    pub async fn start(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind metrics server to {}", self.bind_addr))?;

        info!(bind_addr = %self.bind_addr, "Metrics server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Metrics server shutting down");
            })
            .await
            .context("Metrics server error")?;

        Ok(())
    }
}

/// Serialize the registry. An encoding failure costs only this scrape; the
/// process keeps running.
async fn serve_metrics(State(exporter): State<Arc<MetricsExporter>>) -> Response {
    match exporter.encode_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, MetricsExporter::format_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics for scrape");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
