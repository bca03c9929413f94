use axum::{response::IntoResponse, Json};

use crate::dto::session_dto::CatalogEntry;
use crate::models::test_config::TestCategory;

#[utoipa::path(
    get,
    path = "/api/tests",
    responses(
        (status = 200, description = "Available tests with their time limits and topics", body = [CatalogEntry])
    )
)]
#[axum::debug_handler]
pub async fn list_tests() -> impl IntoResponse {
    let entries: Vec<CatalogEntry> = TestCategory::ALL.into_iter().map(CatalogEntry::from).collect();
    Json(entries)
}
