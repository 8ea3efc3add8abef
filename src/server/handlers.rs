use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::geojson::COMBINED_FEED;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─── GET /api/feed ───────────────────────────────────────────────

/// Serve the combined GeoJSON feed for the map front end.
pub async fn feed(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let path = state.geojson_dir.join(COMBINED_FEED);

    let data = tokio::fs::read_to_string(&path).await.map_err(|_| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("feed not generated yet ({})", path.display()),
        )
    })?;

    let feed: Value = serde_json::from_str(&data)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("corrupt feed: {}", e)))?;

    Ok(Json(feed))
}

// ─── GET /api/stats ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub processed: usize,
    pub geolocated: usize,
    pub skipped: usize,
    pub geolocation_rate: String,
    pub feed_available: bool,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let feed_available = state.geojson_dir.join(COMBINED_FEED).exists();
    Json(StatsResponse {
        processed: state.stats.processed,
        geolocated: state.stats.geolocated,
        skipped: state.stats.skipped,
        geolocation_rate: format!("{:.1}%", state.stats.rate()),
        feed_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineStats;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> Arc<AppState> {
        Arc::new(AppState {
            geojson_dir: dir.path().to_path_buf(),
            stats: PipelineStats {
                processed: 10,
                geolocated: 4,
                skipped: 1,
            },
        })
    }

    #[tokio::test]
    async fn test_feed_missing_is_404() {
        let dir = TempDir::new().unwrap();
        let result = feed(State(state(&dir))).await;
        assert!(matches!(result, Err(ApiError(StatusCode::NOT_FOUND, _))));
    }

    #[tokio::test]
    async fn test_feed_served() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(COMBINED_FEED),
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();

        let Json(feed) = feed(State(state(&dir))).await.unwrap();
        assert_eq!(feed["type"], "FeatureCollection");
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = TempDir::new().unwrap();
        let Json(response) = stats(State(state(&dir))).await;
        assert_eq!(response.processed, 10);
        assert_eq!(response.geolocation_rate, "40.0%");
        assert!(!response.feed_available);
    }
}
