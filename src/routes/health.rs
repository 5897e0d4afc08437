use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::state::AppState;
use crate::store::SyncState;
use crate::ws::hub::HUB;
use super::ApiResponse;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store: SyncState,
    pub revision: u64,
    /// Connected live feed viewers
    pub viewers: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let store = state.store.state().await;
    let revision = state.store.snapshot().await.revision;
    Json(ApiResponse::success(HealthStatus {
        status: if store == SyncState::Live { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        revision,
        viewers: HUB.client_count(),
    }))
}
