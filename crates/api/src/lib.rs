//! HTTP API for the wiki article generator.
//!
//! Generation is asynchronous: `POST /generate` registers a task and runs
//! the article crew in the background; clients poll `GET /status/{task_id}`.
//!
//! # Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check
//! - `POST /generate` - Start generating an article
//! - `GET /status/{task_id}` - Task status, with the article once completed

pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use routes::ErrorResponse;
pub use state::{AppState, TaskStore};

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/generate", post(routes::generate))
        .route("/status/{task_id}", get(routes::status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting wikiscribe API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
