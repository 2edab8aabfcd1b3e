//! brewgate HTTP server
//!
//! This module provides the drinks API with:
//! - Public drink listing at `/drinks`
//! - Permission-guarded drink details and mutations
//! - JSON error bodies for every failure

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::{middleware::from_fn, response::IntoResponse, routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use middleware::Authorized;
use state::ServerState;

/// Create the main application router
pub fn create_app(state: ServerState) -> Router {
    let cors_config = state.config.cors.clone();
    let timeout_duration = Duration::from_secs(state.config.request_timeout_secs);

    let mut app = Router::new()
        .route("/", get(status))
        .merge(routes::drinks::create_router())
        .fallback(not_found)
        .layer(from_fn(middleware::logging_middleware))
        .layer(TimeoutLayer::new(timeout_duration))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // CORS should be outermost
    if cors_config.enabled {
        app = app.layer(middleware::cors_layer(&cors_config));
    }

    app
}

/// Service status endpoint
async fn status() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": true,
        "service": "brewgate",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Serve on an already bound listener until ctrl-c
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<()> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Start the HTTP server
pub async fn start_server(addr: SocketAddr, state: ServerState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting brewgate server on {}", listener.local_addr()?);
    serve(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
