//! API Server

use super::handlers::{self, AppState};
use crate::exporter;
use crate::Result;
use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::cors::CorsLayer;
use tracing::info;

/// REST API server for the user endpoints.
pub struct ApiServer {
    bind_addr: SocketAddr,
    app_state: AppState,
}

impl ApiServer {
    /// Create a new API server.
    pub fn new(bind_addr: SocketAddr, app_state: AppState) -> Self {
        Self {
            bind_addr,
            app_state,
        }
    }

    /// Build the application router with metrics interception and CORS.
    ///
    /// The metrics layer wraps the whole router, so unmatched requests are
    /// observed too (under the "unknown" endpoint label).
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/v1/login", post(handlers::login))
            .route("/api/v1/register", post(handlers::register))
            .route("/api/v1/users", get(handlers::get_users))
            .layer(middleware::from_fn_with_state(
                self.app_state.exporter.clone(),
                exporter::track_http,
            ))
            .layer(CorsLayer::permissive())
            .with_state(self.app_state.clone())
    }

    /// Serve until the shutdown signal arrives.
    pub async fn start(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", self.bind_addr))?;

        info!(bind_addr = %self.bind_addr, "API server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutting down");
            })
            .await
            .context("API server error")?;

        Ok(())
    }
}
