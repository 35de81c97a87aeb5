//! SMS enqueue DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::{Recipients, SmsContent};

/// Request to enqueue SMS messages.
///
/// `phone_numbers` accepts a list or a comma-joined string; `message`
/// accepts one string for all recipients or a recipient -> content mapping.
/// A mapping is authoritative and overrides `phone_numbers`.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "phone_numbers": ["13800000001", "13800000002"],
    "message": "hello"
}))]
pub struct SendSmsRequest {
    #[schema(value_type = Object)]
    pub phone_numbers: Recipients,

    #[schema(value_type = Object)]
    pub message: SmsContent,
}

/// Uniform success acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_list_and_broadcast() {
        let request: SendSmsRequest = serde_json::from_str(
            r#"{"phone_numbers": ["111", "222"], "message": "hi"}"#,
        )
        .unwrap();
        assert!(matches!(request.phone_numbers, Recipients::List(_)));
        assert!(matches!(request.message, SmsContent::Broadcast(_)));
    }

    #[test]
    fn accepts_joined_string_and_mapping() {
        let request: SendSmsRequest = serde_json::from_str(
            r#"{"phone_numbers": "111,222", "message": {"111": "a", "222": "b"}}"#,
        )
        .unwrap();
        assert!(matches!(request.phone_numbers, Recipients::Joined(_)));
        assert!(matches!(request.message, SmsContent::PerRecipient(_)));
    }
}
