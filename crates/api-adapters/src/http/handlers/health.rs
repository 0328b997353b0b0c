use axum::Json;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use domains::AppError;

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Answers unrouted paths with the JSON 404 body.
pub async fn not_found() -> ApiError {
    AppError::not_found("route", "unmatched").into()
}
