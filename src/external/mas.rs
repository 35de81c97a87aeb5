//! CMCC MAS SMS gateway client.
//!
//! The gateway contract: the `mac` field is the lowercase-hex MD5 digest of
//! ecName + apId + secretKey + mobiles + content + sign + addSerial
//! concatenated without separators, and the request body is the base64 of the
//! JSON payload.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::MasConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;

/// MAS gateway client holding gateway credentials.
#[derive(Clone)]
pub struct MasClient {
    config: MasConfig,
}

/// Wire payload posted (base64-encoded) to the gateway.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MasPayload {
    ec_name: String,
    ap_id: String,
    mobiles: String,
    content: String,
    sign: String,
    add_serial: String,
    mac: String,
}

/// Gateway response envelope; anything but `success: true` is a rejection.
#[derive(Debug, Deserialize)]
struct MasResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl MasClient {
    pub fn new(config: MasConfig) -> Self {
        Self { config }
    }

    /// Single-recipient send path.
    pub async fn send_single(&self, mobile: &str, content: &str) -> AppResult<()> {
        self.send_payload(mobile.to_string(), content.to_string())
            .await
    }

    /// Batch send path: one gateway call carrying a recipient -> content mapping.
    ///
    /// Mobiles are comma-joined in map order so they stay aligned with the
    /// JSON-encoded content mapping.
    pub async fn send_bulk(&self, messages: &BTreeMap<String, String>) -> AppResult<()> {
        let mobiles = messages.keys().cloned().collect::<Vec<_>>().join(",");
        let content = serde_json::to_string(&json!({ "content": messages }))?;
        self.send_payload(mobiles, content).await
    }

    /// Lowercase-hex MD5 over the concatenated signing fields.
    fn signature(&self, mobiles: &str, content: &str, add_serial: &str) -> String {
        let raw = format!(
            "{}{}{}{}{}{}{}",
            self.config.ec_name,
            self.config.app_id,
            self.config.secret_key,
            mobiles,
            content,
            self.config.sign,
            add_serial
        );
        hex::encode(Md5::digest(raw.as_bytes()))
    }

    fn build_payload(&self, mobiles: String, content: String) -> MasPayload {
        let add_serial = String::new();
        let mac = self.signature(&mobiles, &content, &add_serial);
        MasPayload {
            ec_name: self.config.ec_name.clone(),
            ap_id: self.config.app_id.clone(),
            mobiles,
            content,
            sign: self.config.sign.clone(),
            add_serial,
            mac,
        }
    }

    async fn send_payload(&self, mobiles: String, content: String) -> AppResult<()> {
        let payload = self.build_payload(mobiles, content);
        let encoded = BASE64.encode(serde_json::to_string(&payload)?);

        let response = HTTP_CLIENT
            .post(&self.config.api_url)
            .json(&encoded)
            .send()
            .await
            .map_err(|e| AppError::Gateway {
                message: format!("transport error: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Gateway {
                message: format!("gateway returned status {}", response.status()),
            });
        }

        let body: MasResponse = response.json().await.map_err(|e| AppError::Gateway {
            message: format!("unreadable gateway response: {e}"),
        })?;

        if !body.success {
            return Err(AppError::Gateway {
                message: format!(
                    "gateway rejected send: {}",
                    body.message.unwrap_or_else(|| "unknown reason".to_string())
                ),
            });
        }

        tracing::info!("SMS gateway accepted send");
        Ok(())
    }
}
