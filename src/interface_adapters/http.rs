// Shared HTTP response helpers so every route reports errors the same way.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string.
    pub error: String,
}

pub fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
