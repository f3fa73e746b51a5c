//! Proxy command - serve the same-origin proxy routes

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use proforma_server::proxy::{self, ProxyState};

use super::{load_config, shutdown_signal};
use crate::output;

pub async fn run(bind: &str, backend_url: Option<&str>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(url) = backend_url {
        config = config.with_backend_url(url)?;
    }

    let state = ProxyState::new(&config.backend_url)?;
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    let addr = listener.local_addr()?;
    info!(%addr, backend = %state.backend_url(), "proxy listening");
    output::success(&format!(
        "Proxy listening on http://{} -> {}",
        addr,
        state.backend_url()
    ));

    axum::serve(listener, proxy::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Proxy server failed")
}
