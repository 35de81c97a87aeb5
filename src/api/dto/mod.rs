//! Data transfer objects for the HTTP API.

mod error;
mod rule;
mod sms;

pub use error::ErrorResponse;
pub use rule::{DeleteRuleParams, FilterRuleRequest, RuleIdResponse};
pub use sms::{MessageResponse, SendSmsRequest};
