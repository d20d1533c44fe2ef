//! Configuration for the quizforge pipeline.
//!
//! Maps directly to `quizforge.toml`. Every section and field has a
//! default, so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
pub struct ForgeConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Remote generation endpoint.
    #[serde(default)]
    pub endpoint: EndpointSettings,
    /// Retry and backoff policy.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Item counts embedded in prompts.
    #[serde(default)]
    pub prompt: PromptSettings,
    /// Reply validation and repair.
    #[serde(default)]
    pub validation: ValidationSettings,
}

impl ForgeConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ForgeError::Config` if the TOML is invalid or fails [`Self::validate`].
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ForgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values that would make the pipeline misbehave.
    ///
    /// # Errors
    /// Returns `ForgeError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let e = &self.endpoint;
        if e.url.trim().is_empty() {
            return Err(ForgeError::Config("endpoint.url must not be empty".into()));
        }
        if e.api_key_header.trim().is_empty() {
            return Err(ForgeError::Config("endpoint.api_key_header must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&e.temperature) {
            return Err(ForgeError::Config(format!(
                "endpoint.temperature must be within 0.0..=2.0 (got {})",
                e.temperature
            )));
        }
        if !(0.0..=1.0).contains(&e.top_p) {
            return Err(ForgeError::Config(format!(
                "endpoint.top_p must be within 0.0..=1.0 (got {})",
                e.top_p
            )));
        }
        if e.max_output_tokens == 0 {
            return Err(ForgeError::Config("endpoint.max_output_tokens must be positive".into()));
        }
        if e.timeout_ms == 0 {
            return Err(ForgeError::Config("endpoint.timeout_ms must be positive".into()));
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ForgeError::Config(
                "retry.max_delay_ms must be at least retry.base_delay_ms".into(),
            ));
        }

        let p = &self.prompt;
        if p.flashcard_count == 0 || p.quiz_count == 0 || p.company_question_count == 0 {
            return Err(ForgeError::Config("prompt item counts must be positive".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Remote text-generation endpoint and its fixed generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Full `generateContent` URL.
    #[serde(default = "default_endpoint_url")]
    pub url: String,
    /// API key. When empty, `api_key_env` is consulted.
    #[serde(default)]
    pub api_key: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Header that carries the API key.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Sampling temperature.
    #[serde(default = "default_0_7")]
    pub temperature: f32,
    /// Top-k sampling.
    #[serde(default = "default_40")]
    pub top_k: u32,
    /// Nucleus sampling.
    #[serde(default = "default_0_95")]
    pub top_p: f32,
    /// Maximum output tokens.
    #[serde(default = "default_8192")]
    pub max_output_tokens: u32,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_60000")]
    pub timeout_ms: u64,
}

impl EndpointSettings {
    /// The configured key, or the value of `api_key_env` if the key is empty.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            api_key: String::new(),
            api_key_env: default_api_key_env(),
            api_key_header: default_api_key_header(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
            timeout_ms: 60_000,
        }
    }
}

/// Retry budget and backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts beyond the first.
    #[serde(default = "default_3")]
    pub max_retries: u32,
    /// Backoff unit: the wait before retry `n` is `base_delay_ms * 2^n`.
    #[serde(default = "default_1000")]
    pub base_delay_ms: u64,
    /// Upper bound on computed backoff waits; a server `retry-after` is honoured as given.
    #[serde(default = "default_60000")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
        }
    }
}

/// Item counts requested in prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Flashcards per deck.
    #[serde(default = "default_6")]
    pub flashcard_count: u32,
    /// Questions per quiz.
    #[serde(default = "default_5")]
    pub quiz_count: u32,
    /// Minimum interview questions per company.
    #[serde(default = "default_100")]
    pub company_question_count: u32,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            flashcard_count: 6,
            quiz_count: 5,
            company_question_count: 100,
        }
    }
}

/// Reply validation, repair and invalid-response logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Whether a failed first attempt triggers one repair call.
    #[serde(default = "default_true")]
    pub repair_enabled: bool,
    /// Whether a quiz item's correct answer must equal one of its options.
    #[serde(default = "default_true")]
    pub enforce_answer_in_options: bool,
    /// JSONL file receiving invalid (prompt, response) pairs. Disabled if unset.
    #[serde(default)]
    pub invalid_log_path: Option<PathBuf>,
    /// Prompt characters kept per log entry.
    #[serde(default = "default_500")]
    pub prompt_log_chars: usize,
    /// Response characters kept per log entry.
    #[serde(default = "default_2000")]
    pub response_log_chars: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            repair_enabled: true,
            enforce_answer_in_options: true,
            invalid_log_path: None,
            prompt_log_chars: 500,
            response_log_chars: 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
fn default_endpoint_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent".to_string()
}
fn default_api_key_env() -> String { "GEMINI_API_KEY".to_string() }
fn default_api_key_header() -> String { "x-goog-api-key".to_string() }
fn default_0_7() -> f32 { 0.7 }
fn default_0_95() -> f32 { 0.95 }
fn default_3() -> u32 { 3 }
fn default_5() -> u32 { 5 }
fn default_6() -> u32 { 6 }
fn default_40() -> u32 { 40 }
fn default_100() -> u32 { 100 }
fn default_500() -> usize { 500 }
fn default_1000() -> u64 { 1000 }
fn default_2000() -> usize { 2000 }
fn default_8192() -> u32 { 8192 }
fn default_60000() -> u64 { 60_000 }
