//! # Remote Metrics Client
//!
//! Ships a snapshot of ledger entries to a running ledger server and waits for
//! the computed report. The request is an explicit request/response exchange:
//! the client owns the timeout and the retry loop, and the server-side engine
//! never learns that a caller gave up.
//!
//! ## Public API
//!
//! - `MetricsApi`: The abstract interface, so callers can swap in a fake.
//! - `MetricsClient`: The `reqwest` implementation against `/api/*`.
//! - `RetryPolicy`: Exponential backoff for transient failures.
//! - `ApiError`: The specific error types that can be returned from this crate.

use analytics::MetricsReport;
use async_trait::async_trait;
use configuration::ClientConfig;
use core_types::{CalculateRequest, ErrorResponse, HealthResponse, RawEntry};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub mod error;
pub mod retry;

pub use error::ApiError;
pub use retry::{RetryPolicy, is_transient};

/// The generic, abstract interface for a remote metrics service.
#[async_trait]
pub trait MetricsApi: Send + Sync {
    /// Checks that the server is up.
    async fn health(&self) -> Result<HealthResponse, ApiError>;

    /// Computes the daily and monthly series for the shipped entries.
    async fn calculate(&self, request: &CalculateRequest) -> Result<MetricsReport, ApiError>;
}

/// A concrete implementation of `MetricsApi` over HTTP.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl MetricsClient {
    /// Builds a client for the server at `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: impl Into<String>, config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::from(config),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convenience wrapper around `calculate` for a plain list of entries.
    pub async fn calculate_entries(
        &self,
        entries: Vec<RawEntry>,
        starting_balance: Option<f64>,
        exchange_rate: Option<f64>,
    ) -> Result<MetricsReport, ApiError> {
        let request = CalculateRequest {
            data: entries,
            starting_balance,
            exchange_rate,
        };
        self.calculate(&request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request built by `build`, rebuilding it for every attempt.
    async fn send_with_retry<T, F>(&self, label: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            match execute::<T>(build()).await {
                Ok(value) => {
                    debug!(request = label, attempt, "Remote request succeeded.");
                    return Ok(value);
                }
                Err(e) if self.retry.should_retry(attempt, &e) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        request = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying."
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl MetricsApi for MetricsClient {
    async fn health(&self) -> Result<HealthResponse, ApiError> {
        let url = self.url("/api/health");
        self.send_with_retry("health", || self.client.get(&url)).await
    }

    async fn calculate(&self, request: &CalculateRequest) -> Result<MetricsReport, ApiError> {
        let url = self.url("/api/calculate");
        self.send_with_retry("calculate", || self.client.post(&url).json(request))
            .await
    }
}

async fn execute<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    } else {
        // Prefer the server's `{"error": ...}` message; fall back to the raw body.
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
