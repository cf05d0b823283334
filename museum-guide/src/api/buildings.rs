//! Catalog listing endpoints

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use museum_common::Building;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct BuildingListResponse {
    pub count: usize,
    pub buildings: Vec<Building>,
}

/// GET /api/buildings
///
/// All catalog buildings in catalog order.
pub async fn list_buildings(State(state): State<AppState>) -> Json<BuildingListResponse> {
    let buildings = state.orchestrator.catalog().buildings().to_vec();
    Json(BuildingListResponse {
        count: buildings.len(),
        buildings,
    })
}

/// GET /api/buildings/:id
pub async fn get_building(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Building>> {
    state
        .orchestrator
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("building {}", id)))
}

/// Build catalog routes
pub fn building_routes() -> Router<AppState> {
    Router::new()
        .route("/api/buildings", get(list_buildings))
        .route("/api/buildings/:id", get(get_building))
}
