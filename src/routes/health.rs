use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "question_bank_version": state.generation_service.bank().version(),
        "provider_configured": state.default_client.is_some(),
    });
    (StatusCode::OK, Json(body))
}
