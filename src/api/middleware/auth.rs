//! API key authentication middleware.
//!
//! Protects the SMS enqueue endpoint: the `x-api-key` header must match the
//! configured shared secret. Rejection happens before any side effect.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the shared API secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware that validates the `x-api-key` header against configuration.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if supplied != Some(state.security.api_key.as_str()) {
        tracing::warn!("API key verification failed");
        return Err(AppError::Unauthorized {
            message: "Unauthorized".to_string(),
        });
    }

    Ok(next.run(request).await)
}
