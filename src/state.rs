//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::config::SecurityConfig;
use crate::services::Services;
use crate::store::Store;

/// Application state containing all shared services and resources.
///
/// Designed to be used with Axum's State extractor. Cloning is cheap since
/// services and the store handle are Arc-backed.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the shared store (health checks)
    pub store: Store,
    /// API key configuration for protected endpoints
    pub security: SecurityConfig,
}

impl AppState {
    /// Creates a new AppState from a store handle and settings.
    pub fn new(store: Store, settings: &crate::config::Settings) -> Self {
        let services = Services::new(store.clone(), settings);
        Self {
            services,
            store,
            security: settings.security.clone(),
        }
    }
}
