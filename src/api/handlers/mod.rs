//! HTTP request handlers.

pub mod feishu;
pub mod health;
pub mod sms;
