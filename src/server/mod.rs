// src/server/mod.rs
//! Operator endpoints over the content layer.
//!
//! ## Routes
//!
//! - `GET|POST /api/revalidate` - Describe or trigger cache invalidation
//! - `GET /api/notion/block?id=` - One enriched block
//! - `GET|POST /api/warm-cache` - Describe or run the cache warm-up
//! - `GET /api/health` - Liveness
//! - `GET /api/stats` - Cache counters and post statistics

mod error;
mod routes;
mod state;

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;

pub use error::ApiError;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/revalidate",
            get(routes::revalidate_status).post(routes::revalidate),
        )
        .route("/api/notion/block", get(routes::block))
        .route(
            "/api/warm-cache",
            get(routes::warm_cache_info).post(routes::warm_cache),
        )
        .route("/api/health", get(routes::health))
        .route("/api/stats", get(routes::stats))
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
