//! HTTP transport for the stats endpoint

use super::{async_trait, FetchError, StatsFetcher, StatsResponse};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the stats payload with a shared reqwest client
pub struct HttpStatsFetcher {
    client: Client,
}

impl HttpStatsFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl StatsFetcher for HttpStatsFetcher {
    async fn fetch(&self, url: &Url) -> Result<StatsResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            // Dropping the response here releases the connection unread
            return Ok(StatsResponse::with_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(StatsResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Request(e.to_string())
    }
}
