//! Stats polling
//!
//! This module fetches the stats payload over HTTP, turns each attempt into
//! a cycle outcome and drives the fixed-interval poll loop that counts
//! consecutive failures. Transport and timing are injected through the
//! [`StatsFetcher`] and [`Sleeper`] traits.

mod cycle;
mod http;
mod r#loop;
mod retry;


pub use cycle::{CycleError, FetchCycle};
pub use http::{HttpStatsFetcher, DEFAULT_REQUEST_TIMEOUT};
pub use r#loop::{PollConfig, PollLoop, PollLoopBuilder, PollOutcome, MAX_ATTEMPTS, POLL_DELAY};
pub use retry::{FailureCounter, FailureState};

use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use async_trait::async_trait;

/// Stats endpoint polled when nothing else is configured
pub const DEFAULT_STATS_URL: &str = "http://srv.msk01.gigacorp.local/_stats";

/// Raw answer from the stats endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsResponse {
    pub status: u16,
    /// Response body; left empty for non-200 responses
    pub body: Vec<u8>,
}

impl StatsResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Trait for stats transport implementations
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    /// Issue a single GET to `url`
    async fn fetch(&self, url: &Url) -> Result<StatsResponse, FetchError>;
}

/// Trait for the wait between poll cycles
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
