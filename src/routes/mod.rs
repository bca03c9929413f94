pub mod catalog;
pub mod generation;
pub mod health;
pub mod session;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::middleware::rate_limit::{limit_generation, GenerationLimiter};
use crate::AppState;

/// Full API router. Only the generation routes are rate limited.
pub fn app(state: AppState, generation_rps: u32) -> Router {
    let generation_api = Router::new()
        .route("/api/generate/questions", post(generation::generate_questions))
        .route(
            "/api/generate/coding-problems",
            post(generation::generate_coding_problems),
        )
        .route("/api/generate/essay-topic", post(generation::generate_essay_topic))
        .layer(axum::middleware::from_fn_with_state(
            GenerationLimiter::new(generation_rps),
            limit_generation,
        ));

    let session_api = Router::new()
        .route("/api/sessions", post(session::create_session))
        .route("/api/sessions/:id", get(session::get_session))
        .route("/api/sessions/:id/api-key", put(session::set_api_key))
        .route("/api/sessions/:id/events", post(session::post_event))
        .route("/api/sessions/:id/progress", get(session::get_progress));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/tests", get(catalog::list_tests))
        .merge(generation_api)
        .merge(session_api)
        .with_state(state)
}
