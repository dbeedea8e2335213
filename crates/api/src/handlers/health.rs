use super::models::AppState;
use crate::models::HealthResponse;
use axum::{extract::State, Json};

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.storage.kind().to_string(),
    })
}
