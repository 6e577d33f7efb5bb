use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::dto::webhook_dto::HealthResponse;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = HealthResponse {
        status: "healthy",
        service: "hookwatch",
        message: "Service is running",
    };
    (StatusCode::OK, Json(body))
}
