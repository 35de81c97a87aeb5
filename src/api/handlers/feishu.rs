//! Feishu relay and filter rule configuration handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::Value;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::FEISHU_TAG;
use crate::api::dto::{DeleteRuleParams, FilterRuleRequest, MessageResponse, RuleIdResponse};
use crate::error::AppResult;
use crate::state::AppState;

/// Creates Feishu relay routes.
///
/// Routes:
/// - POST /send/{token}     - filter and forward a webhook payload
/// - POST /config/{token}   - create/refresh a filter rule
/// - DELETE /config/{token} - delete one rule or all of a channel's rules
pub fn feishu_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(send))
        .routes(routes!(configure_filter, delete_filter))
}

/// POST /api/v1/feishu/send/{token} - Relay a webhook payload
///
/// Applies the same-message dedup window and the channel's filter rules.
/// Forwarded payloads return the upstream response verbatim; suppressed ones
/// return a success envelope of identical shape.
#[utoipa::path(
    post,
    path = "/send/{token}",
    tag = FEISHU_TAG,
    request_body = Value,
    params(("token" = String, Path, description = "Channel token")),
    responses(
        (status = 200, description = "Upstream response or canned success envelope", body = Value)
    )
)]
async fn send(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    tracing::info!(%token, "Webhook relay request");
    let response = state.services.filter.relay(&token, &payload).await?;
    Ok(Json(response))
}

/// POST /api/v1/feishu/config/{token} - Create or refresh a filter rule
#[utoipa::path(
    post,
    path = "/config/{token}",
    tag = FEISHU_TAG,
    request_body = FilterRuleRequest,
    params(("token" = String, Path, description = "Channel token")),
    responses(
        (status = 200, description = "Rule stored", body = RuleIdResponse)
    )
)]
async fn configure_filter(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<FilterRuleRequest>,
) -> AppResult<Json<RuleIdResponse>> {
    let rule_id = state
        .services
        .filter
        .upsert_rule(&token, &request.into())
        .await?;
    Ok(Json(RuleIdResponse { rule_id }))
}

/// DELETE /api/v1/feishu/config/{token} - Delete filter rules
///
/// Deletes the rule named by `rule_id`, or every rule of the channel when
/// the parameter is omitted.
#[utoipa::path(
    delete,
    path = "/config/{token}",
    tag = FEISHU_TAG,
    params(
        ("token" = String, Path, description = "Channel token"),
        DeleteRuleParams
    ),
    responses(
        (status = 200, description = "Rules deleted", body = MessageResponse)
    )
)]
async fn delete_filter(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(params): Query<DeleteRuleParams>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .filter
        .delete_rules(&token, params.rule_id.as_deref())
        .await?;
    Ok(Json(MessageResponse::new("success")))
}
