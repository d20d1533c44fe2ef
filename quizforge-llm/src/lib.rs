//! # quizforge-llm: model access for quizforge
//!
//! Turns a study request into a model call whose reply is checked against
//! the expected shape:
//!   - **Prompt building**: per-task templates with fixed counts and schemas
//!   - **Resilient client**: retries, exponential backoff, `retry-after`
//!   - **Validate-then-repair**: one corrective round-trip, then a warned
//!     best-effort result
//!
//! # Architecture
//!
//! ```text
//! PromptBuilder ─► Pipeline ─► ModelClient ─► TextEndpoint (HTTP / scripted)
//!                     │
//!                     └─► ShapeValidator ─► ValidatedResult
//! ```

pub mod client;
pub mod endpoint;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod types;

pub use client::{ModelClient, RetryPolicy};
pub use endpoint::{EndpointConfig, HttpEndpoint, TextEndpoint};
pub use error::{ErrorKind, LlmError};
pub use pipeline::Pipeline;
pub use prompt::PromptBuilder;
pub use types::{GenerationParams, ModelResponse};
