//! Server module for managing HTTP server lifecycle
//!
//! Handles server initialization, scheduler startup, and graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, Settings};
use crate::external::FeishuClient;
use crate::jobs::{AlarmReporter, JobScheduler, SmsDrainTask};
use crate::state::AppState;
use crate::store::Store;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and the drain scheduler, run until shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = %self.settings.server.port,
            store_backend = ?self.settings.store.backend,
            "Server configuration loaded"
        );

        tracing::info!(
            dedup_ttl = %self.settings.sms.dedup_ttl,
            drain_interval = %self.settings.sms.drain_interval,
            drain_batch_size = %self.settings.sms.drain_batch_size,
            same_message_interval = %self.settings.feishu.same_message_interval,
            "Relay configuration loaded"
        );

        // Initialize the shared store
        let store = Store::from_config(&self.settings.store).await?;
        store.ping().await?;
        tracing::info!("Store connection OK");

        // Create application state with services
        let state = AppState::new(store, &self.settings);
        tracing::info!("Application state created");

        // Start the drain scheduler with its alarm harness
        let alarm = AlarmReporter::new(FeishuClient::new(self.settings.feishu.clone()));
        let mut scheduler = JobScheduler::new(alarm).await?;
        scheduler
            .register(Box::new(SmsDrainTask::new(
                state.services.sms.clone(),
                self.settings.sms.drain_interval,
            )))
            .await?;
        scheduler.start().await?;

        // Create router with all routes and middleware
        let router = create_router(state);
        tracing::info!("Router configured");

        // Bind to the configured address
        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        // Start the server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(e) = scheduler.stop().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
