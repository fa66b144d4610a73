//! JSON response envelope shared by every endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Every successful response is `{success: true, data, message}`; errors use
/// the same shape with `success: false` and `data: null` (see `error.rs`).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

/// 200 envelope.
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    with_status(StatusCode::OK, data, message)
}

/// 201 envelope.
pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    with_status(StatusCode::CREATED, data, message)
}

pub fn with_status<T: Serialize>(
    status: StatusCode,
    data: T,
    message: impl Into<String>,
) -> Response {
    (
        status,
        Json(ApiResponse {
            success: true,
            data,
            message: message.into(),
        }),
    )
        .into_response()
}
