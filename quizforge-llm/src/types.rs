//! Wire types for the `generateContent` endpoint and the client's response type.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Request body POSTed to the endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// One user turn holding the prompt.
    pub contents: Vec<RequestContent>,
    /// Fixed sampling parameters.
    pub generation_config: GenerationParams,
}

impl GenerateRequest {
    /// Wrap a prompt as a single-part user turn.
    #[must_use]
    pub fn new(prompt: impl Into<String>, generation_config: GenerationParams) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.into(),
                }],
            }],
            generation_config,
        }
    }
}

/// Content of a request turn.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    /// Text parts.
    pub parts: Vec<RequestPart>,
}

/// A text part of a request turn.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPart {
    /// The prompt text.
    pub text: String,
}

/// Generation parameters, fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k sampling.
    pub top_k: u32,
    /// Nucleus sampling.
    pub top_p: f32,
    /// Maximum output tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

/// Top-level endpoint reply. Every level is optional so a structurally
/// wrong reply deserializes and is then rejected by [`Self::first_text`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    /// Generated candidates.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated option.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.
    #[serde(default)]
    pub content: Option<CandidateContent>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

/// A content part; only text parts are of interest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    /// Generated text.
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate's first text part.
    ///
    /// Later candidates are never consulted: a blocked first candidate
    /// (e.g. `finishReason: SAFETY`) makes the reply malformed.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }
}

/// Text returned by the resilient client, with call bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    /// The generated text.
    pub text: String,
    /// Whether a call succeeded. Failures surface as errors instead, so this
    /// is `true` for every value the client returns.
    pub succeeded: bool,
    /// Calls made, including the successful one.
    pub attempts: u32,
    /// Kind of the last failure before success, if any call failed.
    pub last_error_kind: Option<ErrorKind>,
}
