//! Retry configuration and the retrying catalog decorator.
//!
//! Only transient failures are retried (see [`CacheError::is_transient()`]):
//! transport errors, 429 and 5xx. `NotFound` and other permanent failures are
//! returned on the first attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::CatalogGateway;
use crate::telemetry;
use crate::types::ModelRecord;
use crate::{CacheError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Exponential backoff, capped at `max_delay`:
///
/// ```rust
/// # use biomodels_cache::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    #[serde(rename = "initial_delay_ms", with = "millis")]
    pub initial_delay: Duration,
    /// Maximum delay between retries. Default: 30s.
    #[serde(rename = "max_delay_ms", with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

/// Durations in config files are given in milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Execute an async operation with retry logic.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    gateway: &str,
    operation: &'static str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..config.max_attempts.max(1) {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < config.max_attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation)
                        .increment(1);
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        gateway,
                        operation,
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| CacheError::remote("no attempt was made")))
}

/// Decorator that wraps a [`CatalogGateway`] with retry logic.
pub struct RetryingCatalog {
    inner: Arc<dyn CatalogGateway>,
    config: RetryConfig,
}

impl RetryingCatalog {
    pub fn new(inner: Arc<dyn CatalogGateway>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl CatalogGateway for RetryingCatalog {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_one(&self, id: &str) -> Result<ModelRecord> {
        with_retry(&self.config, self.inner.name(), "fetch_one", || {
            self.inner.fetch_one(id)
        })
        .await
    }

    async fn fetch_all(&self) -> Result<Vec<ModelRecord>> {
        with_retry(&self.config, self.inner.name(), "fetch_all", || {
            self.inner.fetch_all()
        })
        .await
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>> {
        with_retry(&self.config, self.inner.name(), "download", || {
            self.inner.download(id)
        })
        .await
    }
}
