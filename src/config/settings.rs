//! Configuration settings structures for courier-rs
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "courier-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_pool_size() -> u32 {
    4
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_sms_dedup_ttl() -> u64 {
    60
}

fn default_sms_queue_name() -> String {
    "sms_queue".to_string()
}

fn default_drain_interval() -> u64 {
    5
}

fn default_drain_batch_size() -> usize {
    100
}

fn default_webhook_base_url() -> String {
    "https://open.feishu.cn/open-apis/bot/v2/hook".to_string()
}

fn default_same_message_interval() -> u64 {
    60
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Logger Configuration
// ============================================================================

/// Tracing subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output format: "pretty", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ============================================================================
// Store Configuration
// ============================================================================

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, no persistence; development and tests
    Memory,
    /// Redis-backed durable store
    #[default]
    Redis,
}

/// Redis connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

/// Shared store configuration (dedup keys, SMS queue, filter rules)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis backend settings
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

// ============================================================================
// Security Configuration
// ============================================================================

/// API key protection for the SMS enqueue endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// Shared secret expected in the `x-api-key` request header
    #[serde(default)]
    pub api_key: String,
}

// ============================================================================
// SMS Pipeline Configuration
// ============================================================================

/// SMS enqueue/drain pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Dedup window in seconds for identical (recipient, content) pairs
    #[serde(default = "default_sms_dedup_ttl")]
    pub dedup_ttl: u64,

    /// Name of the durable FIFO queue in the store
    #[serde(default = "default_sms_queue_name")]
    pub queue_name: String,

    /// Seconds between drain ticks
    #[serde(default = "default_drain_interval")]
    pub drain_interval: u64,

    /// Maximum entries popped per drain tick
    #[serde(default = "default_drain_batch_size")]
    pub drain_batch_size: usize,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            dedup_ttl: default_sms_dedup_ttl(),
            queue_name: default_sms_queue_name(),
            drain_interval: default_drain_interval(),
            drain_batch_size: default_drain_batch_size(),
        }
    }
}

// ============================================================================
// Feishu Configuration
// ============================================================================

/// Feishu webhook relay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeishuConfig {
    /// Base URL of the upstream bot webhook; the channel token is appended
    #[serde(default = "default_webhook_base_url")]
    pub webhook_base_url: String,

    /// Channel token used for scheduler alarm cards
    #[serde(default)]
    pub alarm_token: String,

    /// Dedup window in seconds for identical message content
    #[serde(default = "default_same_message_interval")]
    pub same_message_interval: u64,
}

impl Default for FeishuConfig {
    fn default() -> Self {
        Self {
            webhook_base_url: default_webhook_base_url(),
            alarm_token: String::new(),
            same_message_interval: default_same_message_interval(),
        }
    }
}

// ============================================================================
// MAS Gateway Configuration
// ============================================================================

/// CMCC MAS SMS gateway credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MasConfig {
    /// Application id (apId)
    #[serde(default)]
    pub app_id: String,

    /// Shared secret key
    #[serde(default)]
    pub secret_key: String,

    /// Enterprise name (ecName)
    #[serde(default)]
    pub ec_name: String,

    /// Gateway endpoint URL
    #[serde(default)]
    pub api_url: String,

    /// SMS signature label
    #[serde(default)]
    pub sign: String,
}

// ============================================================================
// Settings
// ============================================================================

/// Root configuration for the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub sms: SmsConfig,

    #[serde(default)]
    pub feishu: FeishuConfig,

    #[serde(default)]
    pub mas: MasConfig,
}

impl Settings {
    /// Validate the loaded settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::validation("server.port", "port must not be 0"));
        }

        match self.logger.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError {
                    field: "logger.format".to_string(),
                    message: format!("unknown format '{other}', expected pretty, compact or json"),
                });
            }
        }

        if self.store.backend == StoreBackend::Redis && self.store.redis.url.is_empty() {
            return Err(ConfigError::validation(
                "store.redis.url",
                "redis backend requires a connection URL",
            ));
        }

        if self.sms.drain_batch_size == 0 {
            return Err(ConfigError::validation(
                "sms.drain_batch_size",
                "drain batch size must be greater than 0",
            ));
        }

        if self.sms.queue_name.is_empty() {
            return Err(ConfigError::validation(
                "sms.queue_name",
                "queue name must not be empty",
            ));
        }

        if self.feishu.webhook_base_url.is_empty() {
            return Err(ConfigError::validation(
                "feishu.webhook_base_url",
                "webhook base URL must not be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.sms.dedup_ttl, 60);
        assert_eq!(settings.sms.drain_batch_size, 100);
        assert_eq!(settings.sms.drain_interval, 5);
        assert_eq!(settings.sms.queue_name, "sms_queue");
        assert_eq!(settings.feishu.same_message_interval, 60);
    }

    #[test]
    fn server_address_joins_host_and_port() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(server.address(), "0.0.0.0:8080");
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut settings = Settings::default();
        settings.sms.drain_batch_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let mut settings = Settings::default();
        settings.logger.format = "xml".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn parses_from_toml() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8000

            [store]
            backend = "memory"

            [security]
            api_key = "secret"

            [mas]
            app_id = "app"
            secret_key = "key"
            ec_name = "ec"
            api_url = "https://mas.example.com/send"
            sign = "SGN"
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.security.api_key, "secret");
        assert_eq!(settings.mas.ec_name, "ec");
        // Untouched sections fall back to defaults
        assert_eq!(settings.sms.queue_name, "sms_queue");
        assert!(settings.validate().is_ok());
    }
}
