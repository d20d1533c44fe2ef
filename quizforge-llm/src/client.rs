//! Resilient model client: retry, backoff and rate-limit discipline.
//!
//! Every failed call (non-2xx, network error, timeout, reply without
//! candidate text) is retried with the same budget. The wait before retry
//! `n` (counting from 0) is the server's `retry-after` on a 429 if given,
//! otherwise `base_delay * 2^n`. When the budget is spent the last error is
//! returned wrapped in [`LlmError::ExhaustedRetries`].

use std::sync::Arc;
use std::time::Duration;

use quizforge_core::config::{ForgeConfig, RetrySettings};
use quizforge_core::metrics::PipelineCounters;
use tracing::{debug, warn};

use crate::endpoint::{EndpointConfig, HttpEndpoint, TextEndpoint};
use crate::error::{ErrorKind, LlmError};
use crate::types::ModelResponse;

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts beyond the first; at most `max_retries + 1` calls are made.
    pub max_retries: u32,
    /// Backoff unit.
    pub base_delay: Duration,
    /// Ceiling for computed waits. Server-directed waits are honoured as given.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff unit.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// `base_delay * 2^attempt`, capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Wait before retrying after `error` on `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &LlmError) -> Duration {
        match (error.kind(), error.retry_after()) {
            (Some(ErrorKind::RateLimited), Some(server)) => server,
            _ => self.backoff(attempt),
        }
    }
}

/// Calls a [`TextEndpoint`] under a [`RetryPolicy`].
///
/// Holds no per-request state; one client can serve any number of
/// concurrent requests.
pub struct ModelClient<E> {
    endpoint: E,
    policy: RetryPolicy,
    counters: Arc<PipelineCounters>,
}

impl<E: std::fmt::Debug> std::fmt::Debug for ModelClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("endpoint", &self.endpoint)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ModelClient<HttpEndpoint> {
    /// Build an HTTP client from `quizforge.toml`.
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] if no API key can be resolved.
    pub fn from_config(config: &ForgeConfig) -> Result<Self, LlmError> {
        let endpoint = HttpEndpoint::new(EndpointConfig::from_settings(&config.endpoint)?);
        Ok(Self::new(endpoint, RetryPolicy::from(&config.retry)))
    }
}

impl<E: TextEndpoint> ModelClient<E> {
    /// Create a client with its own counters.
    #[must_use]
    pub fn new(endpoint: E, policy: RetryPolicy) -> Self {
        Self {
            endpoint,
            policy,
            counters: Arc::new(PipelineCounters::new()),
        }
    }

    /// Report into a shared set of counters.
    #[must_use]
    pub fn with_counters(mut self, counters: Arc<PipelineCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// The counters this client reports into.
    #[must_use]
    pub fn counters(&self) -> &Arc<PipelineCounters> {
        &self.counters
    }

    /// The retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The wrapped endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Generate text for `prompt`, retrying failed calls.
    ///
    /// # Errors
    /// Returns [`LlmError::ExhaustedRetries`] carrying the final error once
    /// `max_retries + 1` calls have failed.
    pub async fn generate(&self, prompt: &str) -> Result<ModelResponse, LlmError> {
        let mut attempt: u32 = 0;
        let mut last_error_kind = None;

        loop {
            PipelineCounters::incr(&self.counters.model_calls);

            let error = match self.endpoint.send(prompt).await {
                Ok(text) => {
                    debug!(attempts = attempt + 1, "LLM call succeeded");
                    return Ok(ModelResponse {
                        text,
                        succeeded: true,
                        attempts: attempt + 1,
                        last_error_kind,
                    });
                }
                Err(error) => error,
            };

            let kind = error.kind();
            match kind {
                Some(ErrorKind::RateLimited) => PipelineCounters::incr(&self.counters.rate_limited),
                Some(ErrorKind::MalformedReply) => {
                    PipelineCounters::incr(&self.counters.malformed_replies);
                }
                _ => {}
            }
            last_error_kind = kind.or(last_error_kind);

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= self.policy.max_retries {
                PipelineCounters::incr(&self.counters.exhausted);
                warn!(
                    attempts = attempt + 1,
                    error = %error,
                    "LLM retry budget exhausted"
                );
                return Err(LlmError::ExhaustedRetries {
                    attempts: attempt + 1,
                    last_error: Box::new(error),
                });
            }

            let wait = self.policy.delay_for(attempt, &error);
            PipelineCounters::incr(&self.counters.retries);
            warn!(
                attempt = attempt + 1,
                max_attempts = self.policy.max_retries + 1,
                wait_ms = wait.as_millis() as u64,
                error_kind = ?kind,
                error = %error,
                "LLM call failed; retrying"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}
