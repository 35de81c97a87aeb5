//! Courier-RS Library
//!
//! Core library modules for the Courier-RS notification relay.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod jobs;
pub mod logger;
pub mod server;
pub mod services;
pub mod state;
pub mod store;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
