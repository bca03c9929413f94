use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::session_dto::SetApiKeyRequest;
use crate::error::Result;
use crate::models::session::SessionEvent;
use crate::utils::time::now;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/sessions",
    responses(
        (status = 201, description = "Session created on the dashboard", body = SessionView)
    )
)]
#[axum::debug_handler]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.session_service.create(now()).await;
    (StatusCode::CREATED, Json(view))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Current session view", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.session_service.view(id, now()).await?;
    Ok(Json(view))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{id}/api-key",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = SetApiKeyRequest,
    responses(
        (status = 200, description = "Key stored or cleared", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn set_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetApiKeyRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let view = state
        .session_service
        .set_api_key(id, payload.api_key, now())
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/events",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = SessionEvent,
    responses(
        (status = 200, description = "Event applied", body = SessionView),
        (status = 400, description = "Invalid event payload"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Event not allowed in the current mode"),
        (status = 422, description = "No content available for the requested test")
    )
)]
#[axum::debug_handler]
pub async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<SessionEvent>,
) -> Result<impl IntoResponse> {
    let view = state.session_service.apply(id, event, now()).await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Completed tests with average and best score", body = ProgressSummary),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let summary = state.session_service.progress(id, now()).await?;
    Ok(Json(summary))
}
