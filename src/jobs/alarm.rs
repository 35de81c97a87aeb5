//! Chat alarm reporting for failed task runs.
//!
//! Builds the bilingual alarm card (task name, host, error chain) and sends
//! it through the Feishu alarm channel. Delivery failures are terminal: they
//! are logged and never re-raised.

use serde_json::{Value, json};

use crate::error::AppError;
use crate::external::FeishuClient;

/// Reports task failures as interactive alarm cards.
#[derive(Clone)]
pub struct AlarmReporter {
    feishu: FeishuClient,
    host: String,
}

impl AlarmReporter {
    pub fn new(feishu: FeishuClient) -> Self {
        let host = gethostname::gethostname().to_string_lossy().into_owned();
        Self { feishu, host }
    }

    /// Deliver an alarm for a failed task run. Never fails.
    pub async fn report(&self, task_name: &str, error: &AppError) {
        let card = self.build_card(task_name, &error_chain(error));
        if let Err(e) = self.feishu.send_alarm(&card).await {
            tracing::error!(task = task_name, error = %e, "Failed to deliver task alarm");
        }
    }

    fn build_card(&self, task_name: &str, detail: &str) -> Value {
        json!({
            "config": {},
            "i18n_elements": {
                "zh_cn": [
                    {
                        "tag": "markdown",
                        "content": format!("**脚本：** {task_name}"),
                        "text_align": "left",
                        "text_size": "normal",
                        "icon": {
                            "tag": "standard_icon",
                            "token": "lan_outlined",
                            "color": "grey"
                        }
                    },
                    {
                        "tag": "markdown",
                        "content": format!("**服务器: {}**", self.host),
                        "text_align": "left",
                        "text_size": "normal",
                        "icon": {
                            "tag": "standard_icon",
                            "token": "computer_outlined",
                            "color": "grey"
                        }
                    },
                    {
                        "tag": "markdown",
                        "content": detail,
                        "text_align": "left",
                        "text_size": "normal",
                        "icon": {
                            "tag": "standard_icon",
                            "token": "ram_outlined",
                            "color": "grey"
                        }
                    }
                ]
            },
            "i18n_header": {
                "zh_cn": {
                    "title": {"tag": "plain_text", "content": "🚨脚本异常🚨"},
                    "subtitle": {"tag": "plain_text", "content": ""},
                    "template": "blue"
                }
            }
        })
    }
}

/// Render an error with its full source chain.
fn error_chain(error: &AppError) -> String {
    let mut text = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeishuConfig;

    #[test]
    fn card_carries_task_host_and_error() {
        let reporter = AlarmReporter::new(FeishuClient::new(FeishuConfig::default()));
        let card = reporter.build_card("sms_drain", "Gateway error: boom");

        let elements = card["i18n_elements"]["zh_cn"].as_array().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0]["content"], "**脚本：** sms_drain");
        assert_eq!(elements[2]["content"], "Gateway error: boom");
        assert_eq!(
            card["i18n_header"]["zh_cn"]["title"]["content"],
            "🚨脚本异常🚨"
        );
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = AppError::Internal {
            source: anyhow::anyhow!("root cause").context("outer"),
        };
        let chain = error_chain(&err);
        assert!(chain.starts_with("Internal error"));
        assert!(chain.contains("caused by: outer"));
        assert!(chain.contains("caused by: root cause"));
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        // Default config has no alarm token, so delivery fails; report must
        // still return normally.
        let reporter = AlarmReporter::new(FeishuClient::new(FeishuConfig::default()));
        reporter
            .report(
                "sms_drain",
                &AppError::Gateway {
                    message: "boom".to_string(),
                },
            )
            .await;
    }
}
