//! The remote text-generation capability.
//!
//! [`TextEndpoint`] is the single seam between the pipeline and the network:
//! one prompt in, one text (or one classified error) out. [`HttpEndpoint`]
//! is the production implementation; tests substitute scripted endpoints.

use std::future::Future;
use std::time::{Duration, Instant};

use quizforge_core::config::EndpointSettings;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::LlmError;
use crate::types::{GenerateRequest, GenerateResponse, GenerationParams};

/// One remote generation call. No retries happen at this level.
pub trait TextEndpoint: Send + Sync {
    /// Send `prompt` and return the first candidate's text.
    ///
    /// # Errors
    /// - [`LlmError::Http`] for non-2xx replies (429 may carry `retry_after`)
    /// - [`LlmError::Network`] / [`LlmError::Timeout`] when no reply arrived
    /// - [`LlmError::InvalidResponseFormat`] for 2xx replies without candidate text
    fn send(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Explicit endpoint configuration. Several clients with different
/// configurations can coexist; nothing is read from process-wide state.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Full URL the request is POSTed to.
    pub url: String,
    /// Secret key sent in `api_key_header`.
    pub api_key: String,
    /// Header carrying the key.
    pub api_key_header: String,
    /// Fixed generation parameters.
    pub generation: GenerationParams,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("api_key_header", &self.api_key_header)
            .field("generation", &self.generation)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EndpointConfig {
    /// Create a config with default generation parameters and a 60s timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_key_header: "x-goog-api-key".to_string(),
            generation: GenerationParams::default(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Build from the `[endpoint]` section of `quizforge.toml`.
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] if no API key is configured or set in
    /// the configured environment variable.
    pub fn from_settings(settings: &EndpointSettings) -> Result<Self, LlmError> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            LlmError::Config(format!(
                "no API key: set endpoint.api_key or the {} environment variable",
                settings.api_key_env
            ))
        })?;
        Ok(Self {
            url: settings.url.clone(),
            api_key,
            api_key_header: settings.api_key_header.clone(),
            generation: GenerationParams {
                temperature: settings.temperature,
                top_k: settings.top_k,
                top_p: settings.top_p,
                max_output_tokens: settings.max_output_tokens,
            },
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }

    /// Override the generation parameters.
    #[must_use]
    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `generateContent` over HTTPS via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    config: EndpointConfig,
    http: Client,
}

impl HttpEndpoint {
    /// Create an endpoint with its own connection pool.
    #[must_use]
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Create an endpoint sharing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(config: EndpointConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// The endpoint's configuration.
    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Timeouts report the configured limit, whether hit while sending or
    /// while reading the body.
    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            let millis = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
            LlmError::Timeout(millis)
        } else {
            LlmError::from(err)
        }
    }
}

impl TextEndpoint for HttpEndpoint {
    async fn send(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest::new(prompt, self.config.generation);
        let start = Instant::now();

        let resp = self
            .http
            .post(&self.config.url)
            .header(self.config.api_key_header.as_str(), &self.config.api_key)
            .json(&body)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
                resp.headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after)
            } else {
                None
            };
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        let raw = resp.text().await.map_err(|e| self.transport_error(e))?;
        let reply: GenerateResponse = serde_json::from_str(&raw)
            .map_err(|e| LlmError::InvalidResponseFormat(format!("reply is not JSON: {e}")))?;
        let text = reply.first_text().ok_or_else(|| {
            LlmError::InvalidResponseFormat("first candidate has no text part".to_string())
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "LLM endpoint replied"
        );
        Ok(text.to_string())
    }
}

/// Parse a `retry-after` value given in whole or fractional seconds.
///
/// HTTP-date values are not supported and yield `None`, which falls back
/// to exponential backoff.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_accepts_seconds() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(" 2 "), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after("0.5"), Some(Duration::from_millis(500)));
    }

    #[test]
    fn retry_after_rejects_dates_and_garbage() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-3"), None);
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("inf"), None);
        assert_eq!(parse_retry_after("1e300"), None);
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = EndpointConfig::new("http://localhost", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn from_settings_requires_a_key() {
        let settings = EndpointSettings {
            api_key: String::new(),
            api_key_env: "QUIZFORGE_TEST_NO_SUCH_VAR".into(),
            ..EndpointSettings::default()
        };
        assert!(matches!(
            EndpointConfig::from_settings(&settings),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn from_settings_copies_generation_parameters() {
        let settings = EndpointSettings {
            api_key: "k".into(),
            temperature: 0.2,
            top_k: 8,
            top_p: 0.5,
            max_output_tokens: 256,
            timeout_ms: 1500,
            ..EndpointSettings::default()
        };
        let config = EndpointConfig::from_settings(&settings).expect("config");
        assert_eq!(config.generation.top_k, 8);
        assert_eq!(config.generation.max_output_tokens, 256);
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }
}
