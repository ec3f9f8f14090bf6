//! Probe configuration
//!
//! Only deployment plumbing is configurable. Threshold limits, the failure
//! limit and the poll delay are fixed in `probe_lib`.

use anyhow::{Context, Result};
use probe_lib::poller::DEFAULT_STATS_URL;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Probe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Stats endpoint to poll
    #[serde(default = "default_stats_url")]
    pub stats_url: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_stats_url() -> String {
    DEFAULT_STATS_URL.to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            stats_url: default_stats_url(),
            api_port: default_api_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from `PROBE_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PROBE").try_parsing(true))
            .build()?;

        let probe_config: Self = config
            .try_deserialize()
            .context("Invalid probe configuration")?;
        probe_config.validate()?;

        Ok(probe_config)
    }

    /// Reject settings the probe cannot run with
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.stats_url)
            .with_context(|| format!("Invalid stats URL: {}", self.stats_url))?;

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
