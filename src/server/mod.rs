//! Feed server — exposes the generated GeoJSON feed and run stats to
//! the map visualization. The map renderer itself is a separate
//! front-end collaborator; only the structured feed lives here.

mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::pipeline::PipelineStats;

pub fn build_router(geojson_dir: PathBuf, stats: PipelineStats) -> Router {
    let state = Arc::new(AppState { geojson_dir, stats });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/feed", get(handlers::feed))
        .route("/api/stats", get(handlers::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, geojson_dir: PathBuf, stats: PipelineStats) {
    let app = build_router(geojson_dir, stats);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  telegeo feed server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
