//! Logger initialization
//!
//! Console logging based on `tracing-subscriber` with a configurable level
//! filter and output format (pretty, compact, or JSON).

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggerConfig;

/// Initialize the logger with the given configuration
pub fn init_logger(config: &LoggerConfig) -> anyhow::Result<()> {
    // Create filter from level string
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let is_tty = std::io::stdout().is_terminal();

    match config.format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(is_tty)
                        .with_target(true)
                        .with_level(true)
                        .pretty(),
                )
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_target(true).json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(is_tty)
                        .with_target(true)
                        .with_level(true)
                        .compact(),
                )
                .init();
        }
        other => anyhow::bail!("Unknown log format '{}': expected pretty, compact or json", other),
    }

    Ok(())
}
