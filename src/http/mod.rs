// src/http/mod.rs

//! HTTP surface (axum).
//!
//! | route | handler |
//! |---|---|
//! | `GET /api/test` | liveness probe |
//! | `GET /api/disks` | physical disk listing |
//! | `POST /api/wipe`, `POST /api/factory-reset` | queue a job |
//! | `GET /api/wipe-progress`, `GET /api/factory-progress` | SSE progress |
//! | `GET /wipe_live.json`, `GET /factory_live.json` | journal records |
//!
//! Every route answers cross-origin requests (permissive CORS).

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::orchestrator::Orchestrator;

pub mod handlers;
pub mod sse;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub disks_command: Arc<[String]>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, disks_command: Vec<String>) -> Self {
        Self {
            orchestrator,
            disks_command: disks_command.into(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/test", get(handlers::alive))
        .route("/api/disks", get(handlers::disks))
        .route("/api/wipe", post(handlers::submit_wipe))
        .route("/api/wipe-progress", get(handlers::wipe_progress))
        .route("/api/factory-reset", post(handlers::submit_factory_reset))
        .route("/api/factory-progress", get(handlers::factory_progress))
        .route("/wipe_live.json", get(handlers::wipe_live))
        .route("/factory_live.json", get(handlers::factory_live))
        // The web UI is served from another origin and calls the API and
        // progress streams directly.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("reading listener address")?;
    info!(addr = %addr, "wipeguard HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server error")?;

    info!("HTTP server stopped");
    Ok(())
}
