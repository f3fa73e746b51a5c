//! Backend command - serve the consolidation API

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use proforma_core::ConsolidatorContext;
use proforma_server::backend;

use super::{load_config, shutdown_signal};
use crate::output;

pub async fn run(bind: &str) -> Result<()> {
    let config = load_config()?;
    if config.llm.api_key.is_none() {
        output::warning("OPENAI_API_KEY is not set; consolidate requests will fail until it is");
    }

    let limits = config.limits;
    let model = config.llm.model.clone();
    let context = Arc::new(ConsolidatorContext::new(config)?);

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    let addr = listener.local_addr()?;
    info!(%addr, max_pages = limits.max_pages, max_file_mb = limits.max_file_mb, %model, "backend listening");
    output::success(&format!(
        "Backend listening on http://{} (max {} pages, {}MB per request)",
        addr,
        limits.max_pages,
        limits.max_file_mb
    ));

    axum::serve(listener, backend::router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Backend server failed")
}
