//! Feishu bot webhook client.
//!
//! Treats the upstream webhook as an opaque send(payload) -> response: the
//! relay forwards payloads verbatim and returns the upstream JSON verbatim.

use serde_json::Value;

use crate::config::FeishuConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;

/// Client for the upstream bot webhook, also used for scheduler alarm cards.
#[derive(Clone)]
pub struct FeishuClient {
    config: FeishuConfig,
}

impl FeishuClient {
    pub fn new(config: FeishuConfig) -> Self {
        Self { config }
    }

    /// Forward a payload to the channel identified by `token`, returning the
    /// upstream response JSON unchanged.
    pub async fn forward(&self, token: &str, payload: &Value) -> AppResult<Value> {
        let url = format!("{}/{}", self.config.webhook_base_url, token);

        let response = HTTP_CLIENT
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Webhook {
                message: format!("transport error: {e}"),
            })?;

        let body: Value = response.json().await.map_err(|e| AppError::Webhook {
            message: format!("unreadable webhook response: {e}"),
        })?;

        tracing::info!(response = %body, "Webhook forwarded");
        Ok(body)
    }

    /// Deliver an alarm card to the configured alarm channel.
    pub async fn send_alarm(&self, card: &Value) -> AppResult<Value> {
        if self.config.alarm_token.is_empty() {
            return Err(AppError::Webhook {
                message: "no alarm token configured".to_string(),
            });
        }
        let token = self.config.alarm_token.clone();
        self.forward(&token, card).await
    }
}
