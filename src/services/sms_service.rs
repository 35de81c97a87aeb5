//! SMS pipeline: request normalization, deduplicating enqueue, batch drain.
//!
//! Enqueue runs in the request-serving context and must be safe under
//! arbitrary concurrent invocation; correctness rests entirely on the store's
//! atomic set-if-absent. The drain side is a single consumer driven by the
//! job scheduler.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::config::SmsConfig;
use crate::error::{AppError, AppResult};
use crate::external::MasClient;
use crate::store::Store;

/// Recipients as supplied by callers: a list or a comma-joined string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    List(Vec<String>),
    Joined(String),
}

/// Message content: one string for all recipients, or per-recipient contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SmsContent {
    Broadcast(String),
    PerRecipient(BTreeMap<String, String>),
}

/// One discrete per-recipient message, as persisted in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    #[serde(rename = "phone_number")]
    pub recipient: String,
    #[serde(rename = "message")]
    pub content: String,
}

/// What one drain tick should do with the popped batch.
#[derive(Debug, PartialEq, Eq)]
enum SendPlan {
    Nothing,
    Single(String, String),
    Bulk(BTreeMap<String, String>),
}

#[derive(Clone)]
pub struct SmsService {
    store: Store,
    mas: MasClient,
    config: SmsConfig,
}

impl SmsService {
    pub fn new(store: Store, mas: MasClient, config: SmsConfig) -> Self {
        Self { store, mas, config }
    }

    /// Normalize heterogeneous request shapes into discrete per-recipient
    /// messages.
    ///
    /// A per-recipient content mapping is authoritative: its keys become the
    /// recipient list, overriding whatever was supplied separately. A single
    /// content string is broadcast to every recipient. Recipient strings are
    /// trimmed of surrounding whitespace.
    pub fn normalize(
        &self,
        recipients: &Recipients,
        content: &SmsContent,
    ) -> AppResult<Vec<SmsMessage>> {
        match content {
            SmsContent::PerRecipient(map) => {
                if map.is_empty() {
                    return Err(empty_input("message"));
                }
                Ok(map
                    .iter()
                    .map(|(recipient, content)| SmsMessage {
                        recipient: recipient.trim().to_string(),
                        content: content.clone(),
                    })
                    .collect())
            }
            SmsContent::Broadcast(text) => {
                if text.is_empty() {
                    return Err(empty_input("message"));
                }
                let list: Vec<String> = match recipients {
                    Recipients::List(list) => list.clone(),
                    Recipients::Joined(joined) => {
                        joined.split(',').map(str::to_string).collect()
                    }
                };
                if list.is_empty() || matches!(recipients, Recipients::Joined(j) if j.is_empty()) {
                    return Err(empty_input("phone_numbers"));
                }
                Ok(list
                    .iter()
                    .map(|recipient| SmsMessage {
                        recipient: recipient.trim().to_string(),
                        content: text.clone(),
                    })
                    .collect())
            }
        }
    }

    /// Deduplicate each message against the store and push survivors onto the
    /// durable queue. Suppressed duplicates are logged, never reported to the
    /// caller.
    pub async fn enqueue(&self, messages: &[SmsMessage]) -> AppResult<()> {
        for message in messages {
            let key = format!("mas:sms:{}", fingerprint(message));

            if !self
                .store
                .set_nx_ex(&key, "sent", self.config.dedup_ttl)
                .await?
            {
                tracing::warn!(
                    recipient = %message.recipient,
                    ttl = self.config.dedup_ttl,
                    "Duplicate SMS suppressed within dedup window"
                );
                continue;
            }

            let entry = serde_json::to_string(message)?;
            self.store.push_back(&self.config.queue_name, &entry).await?;
        }
        Ok(())
    }

    /// One drain tick: pop a bounded batch, group it, and dispatch one
    /// gateway call. Returns the number of entries drained.
    ///
    /// Gateway errors propagate to the scheduler's alarm harness; the popped
    /// batch is not re-queued (at-most-once delivery attempt per drain).
    pub async fn drain_once(&self) -> AppResult<usize> {
        let batch = self.collect_batch().await?;
        let drained = batch.len();

        match plan_send(batch) {
            SendPlan::Nothing => {}
            SendPlan::Single(recipient, content) => {
                tracing::info!(%recipient, "Sending single SMS");
                self.mas.send_single(&recipient, &content).await?;
            }
            SendPlan::Bulk(messages) => {
                tracing::info!(recipients = messages.len(), "Sending SMS batch");
                self.mas.send_bulk(&messages).await?;
            }
        }

        Ok(drained)
    }

    /// Pop up to the configured batch size, stopping early on an empty queue.
    /// Malformed entries are dropped with a warning; the batch continues.
    async fn collect_batch(&self) -> AppResult<Vec<SmsMessage>> {
        let mut batch = Vec::new();
        let mut popped = 0usize;

        while popped < self.config.drain_batch_size {
            let Some(raw) = self.store.pop_front(&self.config.queue_name).await? else {
                break;
            };
            popped += 1;

            match serde_json::from_str::<SmsMessage>(&raw) {
                Ok(message) => batch.push(message),
                Err(e) => {
                    tracing::warn!(error = %e, entry = %raw, "Dropping malformed queue entry");
                }
            }
        }

        if !batch.is_empty() {
            tracing::info!(count = batch.len(), "Drained SMS batch");
        }
        Ok(batch)
    }
}

/// Stable dedup fingerprint over (recipient, content).
fn fingerprint(message: &SmsMessage) -> String {
    let raw = format!("{}_{}", message.recipient, message.content);
    hex::encode(Md5::digest(raw.as_bytes()))
}

/// Group a drained batch by recipient (last write wins) and pick the send
/// path: single call for one recipient, one bulk call otherwise.
fn plan_send(batch: Vec<SmsMessage>) -> SendPlan {
    let mut grouped: BTreeMap<String, String> = BTreeMap::new();
    for message in batch {
        grouped.insert(message.recipient, message.content);
    }

    match grouped.len() {
        0 => SendPlan::Nothing,
        1 => {
            let (recipient, content) = grouped.into_iter().next().unwrap_or_default();
            SendPlan::Single(recipient, content)
        }
        _ => SendPlan::Bulk(grouped),
    }
}

fn empty_input(field: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        reason: "must not be empty".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MasConfig;
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn test_service(store: Store) -> SmsService {
        SmsService::new(
            store,
            MasClient::new(MasConfig::default()),
            SmsConfig::default(),
        )
    }

    fn memory_service() -> (SmsService, Store) {
        let store = Store::with_backend(Arc::new(MemoryStore::new()));
        (test_service(store.clone()), store)
    }

    #[test]
    fn broadcast_to_list() {
        let (service, _) = memory_service();
        let messages = service
            .normalize(
                &Recipients::List(vec!["111".to_string(), "222".to_string()]),
                &SmsContent::Broadcast("hi".to_string()),
            )
            .unwrap();
        assert_eq!(
            messages,
            vec![
                SmsMessage {
                    recipient: "111".to_string(),
                    content: "hi".to_string()
                },
                SmsMessage {
                    recipient: "222".to_string(),
                    content: "hi".to_string()
                },
            ]
        );
    }

    #[test]
    fn comma_joined_recipients_are_split_and_trimmed() {
        let (service, _) = memory_service();
        let messages = service
            .normalize(
                &Recipients::Joined("111, 222 ,333".to_string()),
                &SmsContent::Broadcast("hi".to_string()),
            )
            .unwrap();
        let recipients: Vec<&str> = messages.iter().map(|m| m.recipient.as_str()).collect();
        assert_eq!(recipients, vec!["111", "222", "333"]);
    }

    #[test]
    fn content_mapping_overrides_supplied_recipients() {
        let (service, _) = memory_service();
        let mut map = BTreeMap::new();
        map.insert("333".to_string(), "a".to_string());
        map.insert("444".to_string(), "b".to_string());

        let messages = service
            .normalize(
                &Recipients::List(vec!["111".to_string()]),
                &SmsContent::PerRecipient(map),
            )
            .unwrap();

        let recipients: Vec<&str> = messages.iter().map(|m| m.recipient.as_str()).collect();
        assert_eq!(recipients, vec!["333", "444"]);
        assert_eq!(messages[0].content, "a");
        assert_eq!(messages[1].content, "b");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let (service, _) = memory_service();
        assert!(matches!(
            service.normalize(
                &Recipients::List(vec![]),
                &SmsContent::Broadcast("hi".to_string())
            ),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            service.normalize(
                &Recipients::List(vec!["111".to_string()]),
                &SmsContent::Broadcast(String::new())
            ),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            service.normalize(
                &Recipients::List(vec!["111".to_string()]),
                &SmsContent::PerRecipient(BTreeMap::new())
            ),
            Err(AppError::Validation { .. })
        ));
    }

    proptest! {
        #[test]
        fn one_message_per_recipient(recipients in proptest::collection::vec("[0-9]{4,11}", 1..20)) {
            let (service, _) = memory_service();
            let messages = service
                .normalize(
                    &Recipients::List(recipients.clone()),
                    &SmsContent::Broadcast("hello".to_string()),
                )
                .unwrap();
            prop_assert_eq!(messages.len(), recipients.len());
            for (message, recipient) in messages.iter().zip(recipients.iter()) {
                prop_assert_eq!(&message.recipient, recipient);
                prop_assert_eq!(message.content.as_str(), "hello");
            }
        }
    }

    #[tokio::test]
    async fn enqueue_pushes_serialized_entries() {
        let (service, store) = memory_service();
        let messages = vec![
            SmsMessage {
                recipient: "111".to_string(),
                content: "hi".to_string(),
            },
            SmsMessage {
                recipient: "222".to_string(),
                content: "hi".to_string(),
            },
        ];

        service.enqueue(&messages).await.unwrap();

        let first = store.pop_front("sms_queue").await.unwrap().unwrap();
        assert_eq!(first, r#"{"phone_number":"111","message":"hi"}"#);
        assert!(store.pop_front("sms_queue").await.unwrap().is_some());
        assert!(store.pop_front("sms_queue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_within_window() {
        let (service, store) = memory_service();
        let messages = vec![SmsMessage {
            recipient: "111".to_string(),
            content: "hi".to_string(),
        }];

        service.enqueue(&messages).await.unwrap();
        service.enqueue(&messages).await.unwrap();

        assert!(store.pop_front("sms_queue").await.unwrap().is_some());
        assert!(store.pop_front("sms_queue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_entries_are_dropped_and_batch_continues() {
        let (service, store) = memory_service();
        store.push_back("sms_queue", "not json").await.unwrap();
        store
            .push_back("sms_queue", r#"{"phone_number":"111","message":"hi"}"#)
            .await
            .unwrap();

        let batch = service.collect_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].recipient, "111");
    }

    #[tokio::test]
    async fn collect_stops_at_batch_size() {
        let store = Store::with_backend(Arc::new(MemoryStore::new()));
        let mut config = SmsConfig::default();
        config.drain_batch_size = 3;
        let service = SmsService::new(
            store.clone(),
            MasClient::new(MasConfig::default()),
            config,
        );

        for i in 0..5 {
            let entry = format!(r#"{{"phone_number":"{i}","message":"hi"}}"#);
            store.push_back("sms_queue", &entry).await.unwrap();
        }

        let batch = service.collect_batch().await.unwrap();
        assert_eq!(batch.len(), 3);
        // Remainder stays queued for the next tick
        assert!(store.pop_front("sms_queue").await.unwrap().is_some());
        assert!(store.pop_front("sms_queue").await.unwrap().is_some());
        assert!(store.pop_front("sms_queue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op_tick() {
        let (service, _) = memory_service();
        assert_eq!(service.drain_once().await.unwrap(), 0);
    }

    #[test]
    fn plan_groups_last_write_wins() {
        let batch = vec![
            SmsMessage {
                recipient: "111".to_string(),
                content: "first".to_string(),
            },
            SmsMessage {
                recipient: "111".to_string(),
                content: "second".to_string(),
            },
        ];
        assert_eq!(
            plan_send(batch),
            SendPlan::Single("111".to_string(), "second".to_string())
        );
    }

    #[test]
    fn plan_uses_bulk_path_for_multiple_recipients() {
        let batch = vec![
            SmsMessage {
                recipient: "111".to_string(),
                content: "hi".to_string(),
            },
            SmsMessage {
                recipient: "222".to_string(),
                content: "hi".to_string(),
            },
        ];
        match plan_send(batch) {
            SendPlan::Bulk(messages) => {
                assert_eq!(messages.get("111").map(String::as_str), Some("hi"));
                assert_eq!(messages.get("222").map(String::as_str), Some("hi"));
            }
            other => panic!("expected bulk plan, got {other:?}"),
        }
    }

    #[test]
    fn fingerprint_matches_recipient_underscore_content() {
        let message = SmsMessage {
            recipient: "111".to_string(),
            content: "hi".to_string(),
        };
        // md5("111_hi")
        assert_eq!(fingerprint(&message), "097eca5d098f7c2c6d1c99c8db44812a");
    }
}
