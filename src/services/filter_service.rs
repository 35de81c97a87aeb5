//! Feishu relay: per-channel filter rules and the content filter engine.
//!
//! Rules are keyed by a content hash of their canonical (include, exclude)
//! body, which makes rule creation idempotent: resubmitting the same pair
//! yields the same rule id and merely refreshes the TTL.

use md5::{Digest, Md5};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::FeishuConfig;
use crate::error::AppResult;
use crate::external::FeishuClient;
use crate::store::Store;

/// Substring marker identifying timestamp noise to drop from collected content.
const TIME_MARKER: &str = "时间";

/// A filter rule as submitted by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// TTL in seconds; 0 means the rule never expires.
    #[serde(default)]
    pub expires: u64,
}

/// Canonical persisted rule body; `expires` is deliberately excluded so the
/// content hash only covers the (include, exclude) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleBody {
    include: Vec<String>,
    exclude: Vec<String>,
}

/// Outcome of evaluating a payload against dedup and channel rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    Suppress,
}

#[derive(Clone)]
pub struct FilterService {
    store: Store,
    feishu: FeishuClient,
    config: FeishuConfig,
}

impl FilterService {
    pub fn new(store: Store, feishu: FeishuClient, config: FeishuConfig) -> Self {
        Self {
            store,
            feishu,
            config,
        }
    }

    /// Create or refresh a rule for a channel. Returns the content-hash id.
    pub async fn upsert_rule(&self, token: &str, rule: &FilterRule) -> AppResult<String> {
        let body = RuleBody {
            include: rule.include.clone(),
            exclude: rule.exclude.clone(),
        };
        let canonical = serde_json::to_string(&body)?;
        let rule_id = hex::encode(Md5::digest(canonical.as_bytes()));

        let key = rule_key(token, &rule_id);
        let ttl = (rule.expires > 0).then_some(rule.expires);
        self.store.set(&key, &canonical, ttl).await?;

        tracing::info!(%token, %rule_id, "Filter rule stored");
        Ok(rule_id)
    }

    /// Delete one rule by id, or every rule for the channel when no id is given.
    pub async fn delete_rules(&self, token: &str, rule_id: Option<&str>) -> AppResult<()> {
        match rule_id {
            Some(id) => {
                let key = rule_key(token, id);
                tracing::warn!(rule = %key, "Deleting filter rule");
                self.store.remove(&key).await?;
            }
            None => {
                for key in self.store.keys(&rule_pattern(token)).await? {
                    tracing::warn!(rule = %key, "Deleting filter rule");
                    self.store.remove(&key).await?;
                }
            }
        }
        Ok(())
    }

    /// Load all active rules for a channel. Entries that expired between the
    /// key scan and the read, or that fail to parse, are skipped.
    async fn load_rules(&self, token: &str) -> AppResult<Vec<FilterRule>> {
        let mut rules = Vec::new();
        for key in self.store.keys(&rule_pattern(token)).await? {
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<RuleBody>(&raw) {
                Ok(body) => rules.push(FilterRule {
                    include: body.include,
                    exclude: body.exclude,
                    expires: 0,
                }),
                Err(e) => {
                    tracing::warn!(rule = %key, error = %e, "Skipping unparseable rule");
                }
            }
        }
        Ok(rules)
    }

    /// Decide whether a payload should be forwarded to the channel webhook.
    ///
    /// Walks the payload for `"content"` strings, drops timestamp noise,
    /// applies the same-message dedup window, then evaluates every channel
    /// rule. Any failing rule suppresses the payload.
    pub async fn evaluate(&self, token: &str, payload: &Value) -> AppResult<Verdict> {
        let mut contents = collect_contents(payload);
        contents.retain(|content| !content.contains(TIME_MARKER));

        let fingerprint = hex::encode(Md5::digest(serde_json::to_string(&contents)?.as_bytes()));
        let cache_key = format!("feishu:{fingerprint}");

        if !self
            .store
            .set_nx_ex(&cache_key, "sent", self.config.same_message_interval)
            .await?
        {
            tracing::warn!(
                interval = self.config.same_message_interval,
                "Identical message suppressed within dedup window"
            );
            return Ok(Verdict::Suppress);
        }

        for rule in self.load_rules(token).await? {
            if !(apply_include(&contents, &rule.include) && apply_exclude(&contents, &rule.exclude))
            {
                tracing::info!(%token, "Payload suppressed by filter rule");
                return Ok(Verdict::Suppress);
            }
        }

        Ok(Verdict::Forward)
    }

    /// Evaluate and, on a forward verdict, pass the unmodified payload to the
    /// upstream webhook. Suppression returns the canned success envelope, so
    /// callers cannot tell a suppressed message from a delivered one.
    pub async fn relay(&self, token: &str, payload: &Value) -> AppResult<Value> {
        match self.evaluate(token, payload).await? {
            Verdict::Forward => self.feishu.forward(token, payload).await,
            Verdict::Suppress => Ok(suppressed_envelope()),
        }
    }
}

fn rule_key(token: &str, rule_id: &str) -> String {
    format!("rules:{token}:{rule_id}")
}

fn rule_pattern(token: &str) -> String {
    format!("rules:{token}:*")
}

/// Success envelope shaped identically to the upstream webhook's success
/// response.
pub fn suppressed_envelope() -> Value {
    json!({
        "StatusCode": 0,
        "StatusMessage": "success",
        "code": 0,
        "data": {},
        "msg": "success"
    })
}

/// Collect every string value stored under a key literally named "content",
/// skipping values that are empty after trimming. Depth-first in document
/// order; duplicates are kept.
pub fn collect_contents(payload: &Value) -> Vec<String> {
    let mut out = Vec::new();
    walk(payload, &mut out);
    out
}

fn walk(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "content" {
                    if let Value::String(text) = child {
                        if !text.trim().is_empty() {
                            out.push(text.clone());
                        }
                        continue;
                    }
                }
                walk(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

/// Include check: vacuously true with no patterns or no contents, otherwise
/// true iff at least one pattern matches at least one content string.
pub fn apply_include(contents: &[String], include: &[String]) -> bool {
    if include.is_empty() || contents.is_empty() {
        return true;
    }
    contents
        .iter()
        .any(|item| include.iter().any(|pattern| pattern_matches(pattern, item)))
}

/// Exclude check: true iff no pattern matches any content string.
pub fn apply_exclude(contents: &[String], exclude: &[String]) -> bool {
    !contents
        .iter()
        .any(|item| exclude.iter().any(|pattern| pattern_matches(pattern, item)))
}

/// Substring-regex search. An invalid pattern never matches.
fn pattern_matches(pattern: &str, text: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::warn!(%pattern, error = %e, "Skipping invalid rule pattern");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn memory_service() -> (FilterService, Store) {
        let store = Store::with_backend(Arc::new(MemoryStore::new()));
        let config = FeishuConfig::default();
        let service = FilterService::new(
            store.clone(),
            FeishuClient::new(config.clone()),
            config,
        );
        (service, store)
    }

    #[test]
    fn include_truth_table() {
        assert!(apply_include(&strings(&["abc"]), &[]));
        assert!(apply_include(&[], &strings(&["a"])));
        assert!(apply_include(&strings(&["abc"]), &strings(&["a"])));
        assert!(!apply_include(&strings(&["abc"]), &strings(&["z"])));
        assert!(apply_include(&strings(&["a", "b", "c"]), &strings(&["a", "b"])));
        assert!(!apply_include(&strings(&["a", "b", "c"]), &strings(&["d", "e"])));
    }

    #[test]
    fn exclude_truth_table() {
        assert!(apply_exclude(&strings(&["abc"]), &[]));
        assert!(apply_exclude(&[], &strings(&["a"])));
        assert!(apply_exclude(&strings(&["abc"]), &strings(&["z"])));
        assert!(!apply_exclude(&strings(&["abc"]), &strings(&["a"])));
        assert!(!apply_exclude(&strings(&["abc", "bc", "c"]), &strings(&["a", "b"])));
        assert!(apply_exclude(&strings(&["abc", "bc", "c"]), &strings(&["d", "e"])));
    }

    #[test]
    fn invalid_pattern_never_matches() {
        assert!(!apply_include(&strings(&["abc"]), &strings(&["["])));
        assert!(apply_exclude(&strings(&["abc"]), &strings(&["["])));
    }

    #[test]
    fn collects_content_strings_depth_first() {
        let payload = json!({
            "msg_type": "interactive",
            "card": {
                "elements": [
                    {"tag": "markdown", "content": "first"},
                    {"tag": "markdown", "content": "  "},
                    {"nested": {"content": "second"}}
                ]
            },
            "content": "top"
        });
        // preserve_order keeps document order; blank content is skipped
        assert_eq!(
            collect_contents(&payload),
            vec!["first".to_string(), "second".to_string(), "top".to_string()]
        );
    }

    #[test]
    fn non_string_content_values_are_recursed_into() {
        let payload = json!({
            "content": {"content": "inner"}
        });
        assert_eq!(collect_contents(&payload), vec!["inner".to_string()]);
    }

    #[tokio::test]
    async fn rule_creation_is_idempotent_by_content() {
        let (service, store) = memory_service();
        let rule = FilterRule {
            include: vec!["a".to_string()],
            exclude: vec!["b".to_string()],
            expires: 0,
        };

        let first = service.upsert_rule("tok", &rule).await.unwrap();
        let second = service.upsert_rule("tok", &rule).await.unwrap();

        assert_eq!(first, second);
        // md5 of the canonical {"include":["a"],"exclude":["b"]} body
        assert_eq!(first, "ea566b17a089e64735a1f74bd4cf383b");
        assert_eq!(store.keys("rules:tok:*").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expires_sets_a_ttl() {
        let (service, store) = memory_service();
        let rule = FilterRule {
            include: vec![],
            exclude: vec![],
            expires: 0,
        };
        let id = service.upsert_rule("tok", &rule).await.unwrap();
        // no expiry when expires == 0
        assert!(store.get(&rule_key("tok", &id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_by_id_and_delete_all() {
        let (service, store) = memory_service();
        let a = service
            .upsert_rule(
                "tok",
                &FilterRule {
                    include: vec!["a".to_string()],
                    exclude: vec![],
                    expires: 0,
                },
            )
            .await
            .unwrap();
        service
            .upsert_rule(
                "tok",
                &FilterRule {
                    include: vec!["b".to_string()],
                    exclude: vec![],
                    expires: 0,
                },
            )
            .await
            .unwrap();

        service.delete_rules("tok", Some(&a)).await.unwrap();
        assert_eq!(store.keys("rules:tok:*").await.unwrap().len(), 1);

        service.delete_rules("tok", None).await.unwrap();
        assert!(store.keys("rules:tok:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn identical_payload_is_suppressed_within_window() {
        let (service, _) = memory_service();
        let payload = json!({"content": "hello"});

        assert_eq!(
            service.evaluate("tok", &payload).await.unwrap(),
            Verdict::Forward
        );
        assert_eq!(
            service.evaluate("tok", &payload).await.unwrap(),
            Verdict::Suppress
        );
    }

    #[tokio::test]
    async fn include_rule_gates_forwarding() {
        let (service, _) = memory_service();
        service
            .upsert_rule(
                "tok",
                &FilterRule {
                    include: vec!["urgent".to_string()],
                    exclude: vec![],
                    expires: 0,
                },
            )
            .await
            .unwrap();

        assert_eq!(
            service
                .evaluate("tok", &json!({"content": "urgent: server down"}))
                .await
                .unwrap(),
            Verdict::Forward
        );
        assert_eq!(
            service
                .evaluate("tok", &json!({"content": "routine check"}))
                .await
                .unwrap(),
            Verdict::Suppress
        );
    }

    #[tokio::test]
    async fn timestamp_noise_yields_empty_contents_still_deduped() {
        let (service, _) = memory_service();
        service
            .upsert_rule(
                "tok",
                &FilterRule {
                    include: vec!["urgent".to_string()],
                    exclude: vec![],
                    expires: 0,
                },
            )
            .await
            .unwrap();

        // The only content carries the timestamp marker: filtered out, so the
        // include check passes vacuously and the payload forwards once.
        let payload = json!({"content": "报警时间 12:00"});
        assert_eq!(
            service.evaluate("tok", &payload).await.unwrap(),
            Verdict::Forward
        );
        // Any other all-noise payload now shares the empty-contents fingerprint.
        let other = json!({"content": "恢复时间 13:00"});
        assert_eq!(
            service.evaluate("tok", &other).await.unwrap(),
            Verdict::Suppress
        );
    }

    #[test]
    fn suppressed_envelope_matches_upstream_success_shape() {
        let envelope = suppressed_envelope();
        assert_eq!(envelope["StatusCode"], 0);
        assert_eq!(envelope["StatusMessage"], "success");
        assert_eq!(envelope["code"], 0);
        assert_eq!(envelope["msg"], "success");
        assert!(envelope["data"].as_object().unwrap().is_empty());
    }
}
