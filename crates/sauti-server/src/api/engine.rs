//! Resident engine status and offload endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;
use sauti_core::ResidentStatus;

#[derive(Serialize)]
pub struct OffloadResponse {
    pub success: bool,
    pub message: String,
}

/// Point-in-time snapshot of the resident slot
pub async fn get_status(State(state): State<AppState>) -> Json<ResidentStatus> {
    Json(state.service.status().await)
}

/// Evict the resident model, releasing device memory
pub async fn offload(State(state): State<AppState>) -> Json<OffloadResponse> {
    info!("Offload requested");
    state.service.offload().await;
    Json(OffloadResponse {
        success: true,
        message: "Device memory released".to_string(),
    })
}
