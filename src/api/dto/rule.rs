//! Filter rule configuration DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::services::FilterRule;

/// Request to create or refresh a filter rule for a channel.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "include": ["urgent"],
    "exclude": ["test"],
    "expires": 3600
}))]
pub struct FilterRuleRequest {
    /// Patterns of which at least one must match for the payload to pass
    pub include: Vec<String>,

    /// Patterns of which none may match for the payload to pass
    pub exclude: Vec<String>,

    /// Rule TTL in seconds; 0 or absent means the rule never expires
    #[serde(default)]
    pub expires: u64,
}

impl From<FilterRuleRequest> for FilterRule {
    fn from(request: FilterRuleRequest) -> Self {
        FilterRule {
            include: request.include,
            exclude: request.exclude,
            expires: request.expires,
        }
    }
}

/// Response carrying the content-hash id of a stored rule.
#[derive(Debug, Serialize, ToSchema)]
pub struct RuleIdResponse {
    pub rule_id: String,
}

/// Query parameters for rule deletion.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteRuleParams {
    /// Rule to delete; all of the channel's rules when omitted
    pub rule_id: Option<String>,
}
