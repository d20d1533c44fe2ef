//! Validate-then-repair pipeline.
//!
//! ```text
//! topic ─► PromptBuilder ─► ModelClient ─► ShapeValidator ─► ValidatedResult
//!                               ▲                │ invalid (first attempt only)
//!                               └── strengthen ◄─┘
//! ```
//!
//! Attempt 1 sends the original prompt. If the reply fails validation it is
//! written to the invalid-response log and attempt 2 resends the prompt
//! with a shape-specific correction. If that fails too, the best raw text
//! is returned with a warning. Only a transport failure on attempt 1 is a
//! hard error; shape problems never are.

use std::sync::Arc;

use quizforge_core::config::ForgeConfig;
use quizforge_core::invalid_log::{InvalidResponse, InvalidResponseSink, JsonlSink, LogLimits};
use quizforge_core::metrics::PipelineCounters;
use quizforge_core::types::{GenerationRequest, TaskKind, ValidatedResult};
use quizforge_core::ShapeValidator;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::ModelClient;
use crate::endpoint::{HttpEndpoint, TextEndpoint};
use crate::error::LlmError;
use crate::prompt::PromptBuilder;

/// Prompt builder, resilient client and validator composed into one call.
pub struct Pipeline<E> {
    client: ModelClient<E>,
    builder: PromptBuilder,
    validator: ShapeValidator,
    sink: Option<Arc<dyn InvalidResponseSink>>,
    limits: LogLimits,
    repair_enabled: bool,
}

impl Pipeline<HttpEndpoint> {
    /// Build the HTTP pipeline described by `quizforge.toml`.
    ///
    /// Opens the invalid-response log if `validation.invalid_log_path` is set.
    ///
    /// # Errors
    /// Returns [`LlmError::Config`] if no API key can be resolved, or
    /// [`LlmError::Forge`] if the log file cannot be opened.
    pub fn from_config(config: &ForgeConfig) -> Result<Self, LlmError> {
        let client = ModelClient::from_config(config)?;
        let mut pipeline = Self::new(client).with_settings(config);
        if let Some(path) = &config.validation.invalid_log_path {
            pipeline = pipeline.with_sink(Arc::new(JsonlSink::open(path)?));
        }
        Ok(pipeline)
    }
}

impl<E: TextEndpoint> Pipeline<E> {
    /// Default prompts, default validator, repair on, no log sink.
    #[must_use]
    pub fn new(client: ModelClient<E>) -> Self {
        Self {
            client,
            builder: PromptBuilder::new(),
            validator: ShapeValidator::new(),
            sink: None,
            limits: LogLimits::default(),
            repair_enabled: true,
        }
    }

    /// Apply the `[prompt]` and `[validation]` sections of `config`.
    #[must_use]
    pub fn with_settings(mut self, config: &ForgeConfig) -> Self {
        self.builder = PromptBuilder::from(&config.prompt);
        self.validator = ShapeValidator::new()
            .with_answer_enforcement(config.validation.enforce_answer_in_options);
        self.limits = LogLimits::from(&config.validation);
        self.repair_enabled = config.validation.repair_enabled;
        self
    }

    /// Replace the prompt builder.
    #[must_use]
    pub fn with_builder(mut self, builder: PromptBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Replace the shape validator (e.g. to swap the extraction strategy).
    #[must_use]
    pub fn with_validator(mut self, validator: ShapeValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Record rejected first replies to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn InvalidResponseSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Enable or disable the repair round-trip.
    #[must_use]
    pub fn with_repair(mut self, enabled: bool) -> Self {
        self.repair_enabled = enabled;
        self
    }

    /// The underlying model client.
    #[must_use]
    pub fn client(&self) -> &ModelClient<E> {
        &self.client
    }

    /// Counters shared with the client.
    #[must_use]
    pub fn counters(&self) -> &Arc<PipelineCounters> {
        self.client.counters()
    }

    /// Build the prompt for `task_kind` about `topic` and run it.
    ///
    /// # Errors
    /// [`LlmError::Forge`] for a blank topic (no call is made), otherwise as
    /// [`Self::run`].
    pub async fn generate(
        &self,
        task_kind: TaskKind,
        topic: &str,
    ) -> Result<ValidatedResult, LlmError> {
        let request = self.builder.build(task_kind, topic)?;
        self.run(&request).await
    }

    /// Run one request through call, validation and at most one repair.
    ///
    /// # Errors
    /// Returns [`LlmError::ExhaustedRetries`] only if the first attempt's
    /// calls all failed. Shape failures are returned as warned results.
    pub async fn run(&self, request: &GenerationRequest) -> Result<ValidatedResult, LlmError> {
        let span = info_span!(
            "generation",
            request_id = %Uuid::new_v4(),
            task_kind = %request.task_kind,
            shape = %request.expected_shape,
        );
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &GenerationRequest) -> Result<ValidatedResult, LlmError> {
        let shape = request.expected_shape;
        let counters = self.client.counters();

        let first = self.client.generate(&request.prompt).await?;
        let first_error = match self.validator.check(&first.text, shape) {
            Ok(payload) => {
                debug!(attempts = first.attempts, "reply validated on first attempt");
                return Ok(ValidatedResult::validated(payload));
            }
            Err(err) => err,
        };

        PipelineCounters::incr(&counters.validation_failures);
        warn!(error = %first_error, "reply failed shape validation");
        self.record_invalid(request, &first.text, &first_error.to_string());

        if !self.repair_enabled {
            return Ok(self.warned(first.text));
        }

        PipelineCounters::incr(&counters.repairs_attempted);
        let repair_prompt = self.builder.strengthen(&request.prompt, shape);
        let second = match self.client.generate(&repair_prompt).await {
            Ok(second) => second,
            Err(err) => {
                warn!(error = %err, "repair call failed; returning first reply unvalidated");
                return Ok(self.warned(first.text));
            }
        };

        match self.validator.check(&second.text, shape) {
            Ok(payload) => {
                PipelineCounters::incr(&counters.repairs_succeeded);
                info!("repair round-trip produced a valid reply");
                Ok(ValidatedResult::validated(payload))
            }
            Err(err) => {
                warn!(error = %err, "repaired reply also failed validation");
                let best = if second.text.trim().is_empty() {
                    first.text
                } else {
                    second.text
                };
                Ok(self.warned(best))
            }
        }
    }

    fn warned(&self, text: String) -> ValidatedResult {
        PipelineCounters::incr(&self.client.counters().warned_results);
        ValidatedResult::unvalidated(text)
    }

    fn record_invalid(&self, request: &GenerationRequest, response: &str, reason: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        let entry = InvalidResponse::new(
            request.task_kind,
            request.expected_shape,
            reason,
            &request.prompt,
            response,
            self.limits,
        );
        if let Err(err) = sink.record(&entry) {
            warn!(error = %err, "failed to record invalid response");
        }
    }
}
