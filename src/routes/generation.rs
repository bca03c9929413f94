use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::dto::generation_dto::GenerateQuestionsRequest;
use crate::error::Result;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/generate/questions",
    request_body = GenerateQuestionsRequest,
    responses(
        (status = 200, description = "Questions from the provider, or bank samples with notices"),
        (status = 400, description = "Invalid payload or non multiple-choice category"),
        (status = 422, description = "No content available for the category and difficulty"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
#[axum::debug_handler]
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let generated = state
        .generation_service
        .generate(
            state.default_client.as_deref(),
            payload.category,
            payload.topic.trim(),
            payload.count,
            payload.difficulty,
        )
        .await?;
    Ok(Json(generated))
}

#[utoipa::path(
    post,
    path = "/api/generate/coding-problems",
    responses(
        (status = 200, description = "Two coding problems"),
        (status = 422, description = "No content available"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
#[axum::debug_handler]
pub async fn generate_coding_problems(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let generated = state
        .generation_service
        .generate_coding_problems(state.default_client.as_deref())
        .await?;
    Ok(Json(generated))
}

#[utoipa::path(
    post,
    path = "/api/generate/essay-topic",
    responses(
        (status = 200, description = "One essay topic"),
        (status = 422, description = "No content available"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
#[axum::debug_handler]
pub async fn generate_essay_topic(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let generated = state
        .generation_service
        .generate_essay_topic(state.default_client.as_deref())
        .await?;
    Ok(Json(generated))
}
