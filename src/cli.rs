//! CLI argument parsing with clap
//!
//! Defines the command-line interface for the relay: the `serve` command
//! plus global configuration overrides.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConfigLoader;
use crate::logger::init_logger;
use crate::server::Server;

/// An outbound notification relay with deduplication and content filtering
#[derive(Parser, Debug)]
#[command(name = "courier-rs")]
#[command(about = "SMS and chat-webhook relay with dedup and rule-based filtering")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (overrides layered config directory loading)
    #[arg(long, short = 'c', global = true, env = "COURIER_CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server and the periodic drain scheduler
    Serve {
        /// Override the server host
        #[arg(long)]
        host: Option<String>,

        /// Override the server port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Load configuration, initialize logging, and run the selected command.
    ///
    /// With no subcommand, `serve` is assumed.
    pub async fn execute(self) -> anyhow::Result<()> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::from_file(path.clone()),
            None => ConfigLoader::new()?,
        };
        let mut settings = loader.load()?;

        if let Some(Commands::Serve { host, port }) = &self.command {
            if let Some(host) = host {
                settings.server.host = host.clone();
            }
            if let Some(port) = port {
                settings.server.port = *port;
            }
        }

        init_logger(&settings.logger)?;

        Server::new(settings).run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_overrides() {
        let cli = Cli::parse_from(["courier-rs", "serve", "--host", "0.0.0.0", "--port", "9000"]);
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve command"),
        }
    }
}
