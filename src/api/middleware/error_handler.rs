//! Error handler for converting AppError to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// Client input problems map to 4xx; store and upstream failures map to
    /// 5xx with sanitized messages (internals never leak to callers).
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Validation { field, reason } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", &format!("{field}: {reason}")),
            ),
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            AppError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("UNAUTHORIZED", message),
            ),
            AppError::NotFound {
                entity,
                field,
                value,
            } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", &format!("{entity} with {field}={value}")),
            ),
            AppError::Store(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("STORE_UNAVAILABLE", "Shared store unavailable"),
            ),
            AppError::Gateway { message } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("GATEWAY_ERROR", "SMS gateway call failed")
                    .with_details(message),
            ),
            AppError::Webhook { message } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("WEBHOOK_ERROR", "Upstream webhook call failed")
                    .with_details(message),
            ),
            AppError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}
