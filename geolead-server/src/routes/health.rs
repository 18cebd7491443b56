//! Health endpoint: GET /health

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub poi_count: usize,
    pub quota_backend: &'static str,
}

/// Health check endpoint
///
/// GET /health
///
/// Reports liveness plus the startup facts an operator checks first.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    tracing::debug!("health check requested");
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        poi_count: state.poi_count,
        quota_backend: state.config.quota_backend_str(),
    })
}
