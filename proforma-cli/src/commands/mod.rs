//! CLI command implementations

pub mod backend;
pub mod health;
pub mod proxy;
pub mod run;

use anyhow::{Context, Result};
use proforma_core::config::Config;
use tracing::info;

/// Load configuration from the environment
pub fn load_config() -> Result<Config> {
    Config::from_env().context("Failed to load configuration")
}

/// Resolves when the process receives Ctrl-C
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
