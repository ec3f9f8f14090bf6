//! A single fetch-and-parse attempt

use super::{FetchError, StatsFetcher};
use crate::models::MetricsRecord;
use crate::parser::{parse_bytes, ParseError};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why a cycle failed
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Parse(#[from] ParseError),
}

impl CycleError {
    /// Short label used in logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            CycleError::Transport(_) => "transport",
            CycleError::Status(_) => "status",
            CycleError::Parse(_) => "parse",
        }
    }
}

/// One GET against the stats endpoint, checked and parsed.
///
/// A cycle never retries; the poll loop decides what happens next.
pub struct FetchCycle {
    fetcher: Arc<dyn StatsFetcher>,
    url: Url,
}

impl FetchCycle {
    pub fn new(fetcher: Arc<dyn StatsFetcher>, url: Url) -> Self {
        Self { fetcher, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and parse one snapshot
    pub async fn run_cycle(&self) -> Result<MetricsRecord, CycleError> {
        let response = self.fetcher.fetch(&self.url).await?;

        if response.status != 200 {
            return Err(CycleError::Status(response.status));
        }

        Ok(parse_bytes(&response.body)?)
    }
}
