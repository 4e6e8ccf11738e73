use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut networks = state.config.supported_networks();
    networks.sort();
    Json(serde_json::json!({ "status": "ok", "networks": networks }))
}
