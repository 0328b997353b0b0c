//! Maps [`AppError`] onto HTTP responses.
//!
//! Field errors answer `400 {"field": ["message", ...]}`; everything else
//! answers `{"detail": "message"}`. Internal failures are logged and the
//! message is replaced before it reaches the client.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::AppError;
use serde::Serialize;
use thiserror::Error;

use super::pagination::PAGE_ENTITY;

const NOT_FOUND: &str = "Not found.";
const INVALID_PAGE: &str = "Invalid page.";
const SERVER_ERROR: &str = "A server error occurred.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Body or query string that could not be decoded at all
    #[error("malformed request: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Detail {
            detail: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::App(err) => err,
            ApiError::Malformed(message) => return detail(StatusCode::BAD_REQUEST, message),
        };
        match err {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::NotFound(entity, key) => {
                tracing::debug!(%entity, %key, "resource not found");
                let message = if entity == PAGE_ENTITY {
                    INVALID_PAGE
                } else {
                    NOT_FOUND
                };
                detail(StatusCode::NOT_FOUND, message)
            }
            AppError::Unauthorized(message) => {
                let mut response = detail(StatusCode::UNAUTHORIZED, message);
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"api\""));
                response
            }
            AppError::Forbidden(message) => detail(StatusCode::FORBIDDEN, message),
            AppError::MethodNotAllowed(method) => detail(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("Method \"{method}\" not allowed."),
            ),
            AppError::Conflict(message) => detail(StatusCode::CONFLICT, message),
            AppError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                detail(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

/// Path segments that do not parse never name an existing resource.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::App(AppError::not_found("path", rejection.body_text()))
    }
}

impl From<domains::ValidationErrors> for ApiError {
    fn from(errors: domains::ValidationErrors) -> Self {
        ApiError::App(errors.into())
    }
}
