use crate::error::ApiError;
use configuration::ClientConfig;
use std::time::Duration;

/// Exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// A policy that gives up after the first failure.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Whether another attempt should follow a failed `attempt`.
    pub fn should_retry(&self, attempt: u32, error: &ApiError) -> bool {
        attempt < self.max_retries && is_transient(error)
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self::new(config.max_retries, config.base_backoff())
    }
}

/// Connection failures, timeouts, server errors and rate limiting may succeed
/// on a later attempt. Everything else is the caller's problem.
pub fn is_transient(error: &ApiError) -> bool {
    match error {
        ApiError::Transport(e) if e.is_connect() || e.is_timeout() => true,
        ApiError::Deserialization(_) | ApiError::InvalidConfig(_) => false,
        other => other
            .status()
            .is_some_and(|status| status >= 500 || status == 429),
    }
}
