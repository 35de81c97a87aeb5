//! Configuration module for courier-rs
//!
//! Layered TOML configuration with environment variable overrides.

mod environment;
mod error;
mod loader;
pub mod settings;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, FeishuConfig, LoggerConfig, MasConfig, RedisStoreConfig, SecurityConfig,
    ServerConfig, Settings, SmsConfig, StoreBackend, StoreConfig,
};
