//! `getme`: one acquisition pass over every stored show.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use getme_core::{load_config, metrics, validate_config, Acquirer, SanitizedConfig, Store};

/// Pending episodes listed per show after a pass.
const SUMMARY_EPISODES: usize = 10;

/// Prometheus text file written next to the store.
const METRICS_FILE: &str = "metrics.prom";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("GETME_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!(config = ?SanitizedConfig::from(&config), "Configuration loaded");

    let registry = Registry::new();
    for metric in metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metrics")?;
    }

    let acquirer = Acquirer::from_config(&config).context("Failed to set up search engines")?;
    if acquirer.dispatcher().registry().is_empty() {
        warn!("No search engines configured, nothing will be found");
    }

    let mut store = Store::open(&config.paths.state_dir)
        .with_context(|| format!("Failed to open store at {:?}", config.paths.state_dir))?;

    for show in store.shows_mut().values_mut() {
        let report = acquirer.acquire(show, &config.paths.watch_dir).await;

        if let Some(e) = &report.found.last_error {
            warn!(show = %show.title, error = %e, "Some searches failed");
        }
        if let Some(e) = &report.downloads.last_error {
            warn!(
                show = %show.title,
                failed = report.downloads.failed,
                error = %e,
                "Some downloads failed"
            );
        }
        info!(
            show = %show.title,
            searched = report.found.jobs,
            found = report.found.torrents.len(),
            downloaded = report.downloads.completed.len(),
            "Finished show"
        );

        for line in show.pending_summary(SUMMARY_EPISODES) {
            println!("{}", line);
        }
    }

    // Flush even when a pass reported errors; progress is in memory only.
    store.close().context("Failed to write store")?;

    if let Err(e) = write_metrics(&registry, &config.paths.state_dir) {
        warn!(error = %e, "Failed to write metrics");
    }

    Ok(())
}

fn write_metrics(registry: &Registry, dir: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    let path = dir.join(METRICS_FILE);
    std::fs::write(&path, buffer).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
