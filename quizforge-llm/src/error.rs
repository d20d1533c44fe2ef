//! LLM error types.

use std::fmt;
use std::time::Duration;

use quizforge_core::ForgeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while calling the model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The endpoint answered with a non-2xx status.
    #[error("LLM endpoint returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
        /// Server-directed wait from a `retry-after` header on a 429.
        retry_after: Option<Duration>,
    },

    /// The request never produced a response.
    #[error("LLM request failed: {0}")]
    Network(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// A 2xx reply without candidate text.
    #[error("LLM response has an invalid format: {0}")]
    InvalidResponseFormat(String),

    /// All retry attempts exhausted.
    #[error("All LLM retry attempts exhausted after {attempts} tries: {last_error}")]
    ExhaustedRetries {
        /// Calls made.
        attempts: u32,
        /// The error from the final call.
        last_error: Box<LlmError>,
    },

    /// Configuration error.
    #[error("LLM configuration error: {0}")]
    Config(String),

    /// Rejected before any call was made.
    #[error(transparent)]
    Forge(#[from] ForgeError),
}

/// Coarse classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure or non-2xx status other than 429.
    Transport,
    /// HTTP 429.
    RateLimited,
    /// 2xx without candidate text.
    MalformedReply,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::RateLimited => "rate_limited",
            Self::MalformedReply => "malformed_reply",
        };
        write!(f, "{name}")
    }
}

impl LlmError {
    /// Classify a call failure. `None` for errors that are not call failures.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            LlmError::Http { status: 429, .. } => Some(ErrorKind::RateLimited),
            LlmError::Http { .. } | LlmError::Network(_) | LlmError::Timeout(_) => {
                Some(ErrorKind::Transport)
            }
            LlmError::InvalidResponseFormat(_) => Some(ErrorKind::MalformedReply),
            LlmError::ExhaustedRetries { last_error, .. } => last_error.kind(),
            LlmError::Config(_) | LlmError::Forge(_) => None,
        }
    }

    /// Whether the retry loop should try again after this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Http { .. }
                | LlmError::Network(_)
                | LlmError::Timeout(_)
                | LlmError::InvalidResponseFormat(_)
        )
    }

    /// Server-directed wait, if the endpoint supplied one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
