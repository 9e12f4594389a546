//! HTTP mapping for domain errors.
//!
//! Validation failures render as a 400 with the field-keyed message map,
//! toggle conflicts as 400 `{"errors": …}`, missing resources as 404.
//! Nothing is silently recovered.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    Forbidden,
}

impl ApiError {
    pub fn forbidden() -> Self {
        ApiError::Forbidden
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(DomainError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            ApiError::Domain(DomainError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::Domain(DomainError::Conflict(msg)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": msg }))).into_response()
            }
            ApiError::Domain(DomainError::Database(msg))
            | ApiError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "detail": "You do not have permission to perform this action."
                })),
            )
                .into_response(),
        }
    }
}
