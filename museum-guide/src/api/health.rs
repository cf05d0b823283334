//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::services::QuotaSnapshot;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("museum-guide")
    pub module: String,
    /// Configured application name
    pub app_name: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub demo_mode: bool,
    pub catalog_size: usize,
    /// Current quota window usage
    pub quota: QuotaSnapshot,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;
    let orchestrator = &state.orchestrator;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "museum-guide".to_string(),
        app_name: state.app_name.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        demo_mode: orchestrator.config().demo_mode,
        catalog_size: orchestrator.catalog().len(),
        quota: orchestrator.quota().snapshot(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
