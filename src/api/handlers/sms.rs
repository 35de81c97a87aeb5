//! SMS enqueue handler.

use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::SMS_TAG;
use crate::api::dto::{MessageResponse, SendSmsRequest};
use crate::error::AppResult;
use crate::state::AppState;

/// Creates SMS routes.
///
/// Routes:
/// - POST /send_sms - normalize, dedup and enqueue SMS messages
pub fn sms_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(send_sms))
}

/// POST /api/v1/mas/send_sms - Enqueue SMS messages
///
/// Normalizes the request into per-recipient messages, suppresses duplicates
/// within the dedup window, and pushes survivors onto the durable queue. The
/// response is uniform success; callers cannot tell which messages were
/// deduplicated.
#[utoipa::path(
    post,
    path = "/send_sms",
    tag = SMS_TAG,
    request_body = SendSmsRequest,
    responses(
        (status = 200, description = "Messages accepted", body = MessageResponse),
        (status = 400, description = "Empty recipients or content"),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("apiKey" = []))
)]
async fn send_sms(
    State(state): State<AppState>,
    Json(request): Json<SendSmsRequest>,
) -> AppResult<Json<MessageResponse>> {
    let messages = state
        .services
        .sms
        .normalize(&request.phone_numbers, &request.message)?;

    tracing::info!(count = messages.len(), "SMS enqueue request");
    state.services.sms.enqueue(&messages).await?;

    Ok(Json(MessageResponse::new("SMS sent successfully")))
}
