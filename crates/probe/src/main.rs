//! Stats Probe - server statistics monitor
//!
//! Polls the stats endpoint once per second, prints a line for every
//! violated threshold and a single notice when the endpoint keeps failing.

use anyhow::Result;
use probe_lib::{
    health::{components, HealthRegistry},
    observability::{ProbeMetrics, StructuredLogger},
    poller::{HttpStatsFetcher, PollLoopBuilder},
    ConsoleSink,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const PROBE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr; stdout carries report lines only
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("Starting stats-probe");

    let config = config::ProbeConfig::load()?;
    info!(stats_url = %config.stats_url, "Probe configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::POLLER).await;

    // Register metrics before the first scrape
    ProbeMetrics::new();

    let logger = StructuredLogger::new(&config.stats_url);
    logger.log_startup(PROBE_VERSION);

    let poll_loop = PollLoopBuilder::new()
        .fetcher(Arc::new(HttpStatsFetcher::new(config.request_timeout())?))
        .url(&config.stats_url)
        .reporter(Arc::new(ConsoleSink))
        .health(health_registry.clone())
        .build()?;

    let app_state = Arc::new(api::AppState::new(health_registry.clone()));
    health_registry.set_ready(true).await;

    let api_port = config.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server stopped");
        }
    });

    tokio::select! {
        _ = poll_loop.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");

    Ok(())
}
