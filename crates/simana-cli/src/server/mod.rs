//! HTTP front end: multipart uploads in, JSON reports out.
//!
//! Analysis failures are reported as `{ "error": message }` with status 200, so clients
//! only have to inspect the body.

mod form;
mod handlers;
mod staging;

use crate::config::ServerConfig;
use crate::error::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use serde_json::{Value, json};
use simana::analysis::capability::{BuiltinCapabilities, Capabilities};
use simana::render::{Renderer, default_renderer};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared, read-only state of every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub renderer: Arc<dyn Renderer>,
    pub capabilities: Arc<dyn Capabilities>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        renderer: Arc<dyn Renderer>,
        capabilities: Arc<dyn Capabilities>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
            capabilities,
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "SimAna API is running" }))
}

async fn health() -> &'static str {
    "OK"
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/contact_map", post(handlers::contact_map))
        .route("/api/dccm", post(handlers::dccm))
        .route("/api/bfactor", post(handlers::bfactor))
        .route("/api/ramachandran", post(handlers::ramachandran))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections.");
}

/// Serves the API until interrupted.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        address = %listener.local_addr()?,
        max_upload_bytes = config.max_upload_bytes,
        "SimAna API listening."
    );

    let state = AppState::new(config, default_renderer(), Arc::new(BuiltinCapabilities));
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
