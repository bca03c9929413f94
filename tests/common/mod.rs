use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use testprep_backend::error::Result;
use testprep_backend::services::ai_service::{CompletionClient, LlmSettings};
use testprep_backend::services::question_bank::QuestionBank;
use testprep_backend::{routes, AppState};

/// Provider stand-in that answers every prompt with the same text.
pub struct CannedClient(pub String);

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub fn app_with(client: Option<Arc<dyn CompletionClient>>, generation_rps: u32) -> Router {
    let bank = Arc::new(QuestionBank::builtin().expect("builtin bank"));
    let state = AppState::from_parts(bank, client, reqwest::Client::new(), LlmSettings::default());
    routes::app(state, generation_rps)
}

pub fn app() -> Router {
    app_with(None, 100)
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}
