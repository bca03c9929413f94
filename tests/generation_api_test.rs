mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use common::{app, app_with, send, CannedClient};

#[tokio::test]
async fn health_reports_bank_version() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["question_bank_version"], 3);
    assert_eq!(body["provider_configured"], false);
}

#[tokio::test]
async fn catalog_lists_every_test() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/tests", None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 6);
    let quant = entries
        .iter()
        .find(|e| e["name"] == "Quantitative Ability Test")
        .unwrap();
    assert_eq!(quant["time_limit_minutes"], 60);
    assert_eq!(quant["question_count"], 30);
    assert_eq!(quant["kind"], "multiple_choice");
    assert_eq!(quant["topics"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn questions_fall_back_to_the_bank_without_a_provider() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/generate/questions",
        Some(json!({
            "category": "Quantitative Ability Test",
            "topic": "Statistics",
            "count": 5,
            "difficulty": "Hard"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "bank");
    assert_eq!(body["content"].as_array().unwrap().len(), 5);
    assert_eq!(body["notices"][0]["kind"], "provider_unavailable");
}

#[tokio::test]
async fn provider_output_wrapped_in_prose_is_recovered() {
    let reply = r#"Sure! Here are your questions:
[{"question": "What is 15% of 200?", "options": ["A) 20", "B) 25", "C) 30", "D) 35"], "correct_answer": "C", "explanation": "0.15 * 200 = 30."}]
Good luck!"#;
    let app = app_with(Some(Arc::new(CannedClient(reply.to_string()))), 100);

    let (status, body) = send(
        &app,
        "POST",
        "/api/generate/questions",
        Some(json!({"category": "Quantitative Ability Test", "topic": "Percentages", "count": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "provider");
    let content = body["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["correct_answer"], "C");
}

#[tokio::test]
async fn invalid_generation_requests_are_rejected() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/generate/questions",
        Some(json!({"category": "English Usage Test", "topic": "Reading Comprehension", "count": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/generate/questions",
        Some(json!({"category": "Coding Test", "topic": "Programming Problems", "count": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Coding Test"));
}

#[tokio::test]
async fn coding_problems_and_essay_topic() {
    let app = app_with(Some(Arc::new(CannedClient("\"Green Software Engineering\"".into()))), 100);

    let (status, body) = send(&app, "POST", "/api/generate/essay-topic", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Green Software Engineering");
    assert_eq!(body["source"], "provider");

    // Not a coding problem, so the bank supplies both.
    let (status, body) = send(&app, "POST", "/api/generate/coding-problems", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "bank");
    assert_eq!(body["content"].as_array().unwrap().len(), 2);
    assert_eq!(body["notices"][0]["kind"], "malformed_response");
}

#[tokio::test]
async fn generation_routes_are_rate_limited() {
    let app = app_with(None, 1);

    let (first, _) = send(&app, "POST", "/api/generate/essay-topic", None).await;
    let (second, body) = send(&app, "POST", "/api/generate/essay-topic", None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limit_exceeded");

    // Session routes share no budget with generation.
    let (status, _) = send(&app, "GET", "/api/tests", None).await;
    assert_eq!(status, StatusCode::OK);
}
