//! Transient-failure retry around a provider client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use wikiscribe_common::{Result, ScribeError};

use crate::client::{LlmClient, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

pub struct RetryingClient<T: LlmClient> {
    inner: T,
    config: RetryConfig,
}

impl<T: LlmClient> RetryingClient<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Only rate limits (429) and server errors (5xx) are retried. Transport
    /// failures and timeouts are final, so the client timeout bounds each call.
    fn is_retryable(error: &ScribeError) -> bool {
        matches!(
            error,
            ScribeError::LlmApi { status, .. } if *status == 429 || (500..600).contains(status)
        )
    }

    /// Delay before the next attempt, in millis. A provider `Retry-After`
    /// wins over the backoff schedule; both are capped by `max_delay_ms`.
    fn delay_for(&self, error: &ScribeError, attempt: u32) -> u64 {
        let requested = match error {
            ScribeError::LlmApi {
                retry_after_secs: Some(secs),
                ..
            } => Some(secs.saturating_mul(1000)),
            _ => None,
        };
        requested
            .unwrap_or_else(|| self.compute_delay(attempt))
            .min(self.config.max_delay_ms)
    }

    fn compute_delay(&self, attempt: u32) -> u64 {
        let base = self.config.initial_delay_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32);
        let jitter = (base * 0.1 * jitter_fraction(attempt)) as u64;
        (base as u64)
            .saturating_add(jitter)
            .min(self.config.max_delay_ms)
    }
}

/// Deterministic pseudo-random fraction in [0, 1) derived from the attempt.
fn jitter_fraction(attempt: u32) -> f64 {
    (attempt.wrapping_mul(2_654_435_761) % 100) as f64 / 100.0
}

#[async_trait]
impl<T: LlmClient> LlmClient for RetryingClient<T> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut attempt = 0;
        loop {
            let err = match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if attempt >= self.config.max_retries || !Self::is_retryable(&err) {
                return Err(err);
            }

            let delay = self.delay_for(&err, attempt);

            warn!(
                provider = %self.inner.provider_name(),
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = delay,
                error = %err,
                "Retrying LLM request"
            );

            tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}
