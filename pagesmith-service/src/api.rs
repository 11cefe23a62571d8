//! HTTP API for the Pagesmith service.
//!
//! This module provides the REST API endpoints for:
//! - Health monitoring
//! - PDF page rasterization

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::StaticConfig;
use crate::rasterize::PageRasterizer;

pub mod rasterize;
use rasterize::{rasterize_document_handler, rasterize_single_page_handler};

/// Application state
pub struct AppState {
    pub rasterizer: Arc<PageRasterizer>,
    pub start_time: Instant,
}

/// Build the API router
pub fn router(rasterizer: Arc<PageRasterizer>, static_config: &StaticConfig) -> Router {
    let state = Arc::new(AppState {
        rasterizer,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Use the configured max document size for uploads
    let max_body_size = static_config.rasterizer.max_document_bytes as usize;

    let api_routes = Router::new()
        .route(
            "/pdf/pages",
            post(rasterize_document_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route(
            "/pdf/pages/{page}",
            post(rasterize_single_page_handler).layer(DefaultBodyLimit::max(max_body_size)),
        );

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let rasterizer_available = state.rasterizer.tool_available().await;

    let status = if rasterizer_available {
        "healthy".to_string()
    } else {
        "degraded: rasterizer tool unavailable".to_string()
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        rasterizer_available,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    rasterizer_available: bool,
}
