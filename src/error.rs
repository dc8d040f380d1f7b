// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// The error type every handler returns, mapped onto an HTTP status and a
/// JSON `{"error": ...}` body.
///
/// Validation failures map to `BadRequest`, missing quizzes/users/awards to
/// `NotFound`, store failures to `InternalServerError`. A submitted answer
/// that references an unknown question is *not* an error (it grades as
/// incorrect), and a failure while collecting candidate awards is logged
/// and degrades to "no new awards" instead of surfacing here.
#[derive(Debug)]
pub enum AppError {
    /// 500. The message is logged, never sent to the client.
    InternalServerError(String),

    /// 400, validation and malformed-payload failures.
    BadRequest(String),

    /// 401, bad credentials or an unusable token.
    AuthError(String),

    /// 404.
    NotFound(String),

    /// 409, unique-key collisions (email, subject name, award name).
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// The bootstrap path boxes startup failures as `dyn Error`.
impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
