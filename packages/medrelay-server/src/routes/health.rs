use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

pub(crate) async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
