//! Health command - ping a backend's health endpoint

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{json, Value};

use proforma_core::config::normalize_url;

use super::load_config;

pub async fn run(url: Option<&str>, json: bool) -> Result<()> {
    let base = match url {
        Some(url) => normalize_url(url, "backend URL")?,
        None => load_config()?.backend_url,
    };
    let endpoint = format!("{}/api/health", base);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    let started = Instant::now();
    let response = client
        .get(&endpoint)
        .send()
        .await
        .with_context(|| format!("Backend unreachable at {}", base))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let elapsed_ms = started.elapsed().as_millis();
    let healthy = status.is_success() && body["status"] == "ok";

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "url": base,
                "status": status.as_u16(),
                "healthy": healthy,
                "elapsed_ms": elapsed_ms,
            }))?
        );
    } else if healthy {
        println!("{} {} ({} ms)", "OK".green().bold(), base, elapsed_ms);
    } else {
        println!("{} {} returned {}", "FAIL".red().bold(), base, status);
    }

    if healthy {
        Ok(())
    } else {
        anyhow::bail!("Backend at {} is not healthy", base)
    }
}
