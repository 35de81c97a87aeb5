//! Router configuration for the API.
//!
//! Centralized route registration and middleware configuration.

use axum::{Json, Router, middleware, routing::get};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{api_key_middleware, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// Routes:
/// - `/api/v1/mas/*`    - SMS enqueue (API-key protected)
/// - `/api/v1/feishu/*` - webhook relay and rule configuration
/// - `/health`          - health probe
/// - `/api-docs/openapi.json` - OpenAPI document
///
/// Middleware is applied in reverse order - last added runs first, so
/// logging runs after request_id has set the ID.
pub fn create_router(state: AppState) -> Router {
    let sms_routes = handlers::sms::sms_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api_key_middleware,
    ));

    let api_routes = OpenApiRouter::new()
        .nest("/mas", sms_routes)
        .nest("/feishu", handlers::feishu::feishu_routes());

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v1", api_routes)
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .route("/api-docs/openapi.json", get(|| async move { Json(api) }))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
