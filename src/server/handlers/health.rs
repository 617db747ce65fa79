use axum::{extract::State, Json};
use serde::Serialize;

use super::super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub llm_available: bool,
}

/// Liveness plus analyzer reachability.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        llm_available: state.analyzer.is_available().await,
    })
}
