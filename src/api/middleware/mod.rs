//! Middleware components for request processing.

mod auth;
mod error_handler;
mod logging;
mod request_id;

pub use auth::{API_KEY_HEADER, api_key_middleware};
pub use logging::logging_middleware;
pub use request_id::{RequestId, request_id_middleware};
