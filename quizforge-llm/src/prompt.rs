//! Prompt templates and the prompt builder.
//!
//! Every structured prompt states the item count, the exact fields each
//! item carries, and that the reply must contain nothing but the requested
//! structure. Repair prompts append a shape-specific correction to the
//! original prompt.

use std::sync::LazyLock;

use quizforge_core::config::PromptSettings;
use quizforge_core::types::{ExpectedShape, GenerationRequest, Schema, TaskKind};
use quizforge_core::ForgeError;
use regex::Regex;

/// Flashcard deck (`{count}`, `{topic}`).
pub const FLASHCARDS_TEMPLATE: &str = r#"Create exactly {count} flashcards about "{topic}".

Each flashcard is a JSON object with exactly two string fields:
- "question": a clear, specific question about the topic
- "answer": a concise, accurate answer

Return ONLY a JSON array of {count} such objects, like:
[{"question": "...", "answer": "..."}]

Do not write any introduction, commentary, explanation, markdown, backticks or numbering before or after the array."#;

/// Multiple-choice quiz (`{count}`, `{topic}`).
pub const QUIZ_TEMPLATE: &str = r#"Create a multiple-choice quiz with exactly {count} questions about "{topic}".

Each question is a JSON object with exactly these fields:
- "question": the question text
- "options": an array of exactly 4 distinct answer strings
- "correctAnswer": a string that is exactly equal to one of the 4 options
- "explanation": one or two sentences explaining why the answer is correct

Return ONLY a JSON array of {count} such objects, like:
[{"question": "...", "options": ["...", "...", "...", "..."], "correctAnswer": "...", "explanation": "..."}]

Do not write any introduction, commentary, explanation, markdown, backticks or numbering before or after the array."#;

/// Interview question bank (`{count}`, `{topic}` is the company or role).
pub const COMPANY_QUESTIONS_TEMPLATE: &str = r#"List at least {count} interview questions that candidates are commonly asked at "{topic}", covering technical, behavioral and company-specific topics.

Each entry is a JSON object with exactly two string fields:
- "question": the interview question
- "answer": a strong, concise model answer

Return ONLY a JSON array of these objects, like:
[{"question": "...", "answer": "..."}]

Do not write any introduction, commentary, markdown, backticks or numbering before or after the array."#;

/// Chat-style explanation (`{topic}` is the user's question).
pub const FREE_TEXT_TEMPLATE: &str = r"You are a patient, knowledgeable tutor. Answer the following clearly and accurately, using examples where they help.

{topic}";

/// Explicit procedure (`{topic}`).
pub const STEP_LIST_TEMPLATE: &str = r"You are a patient, knowledgeable tutor. Explain step by step: {topic}";

/// Appended when the answer must be a numbered list.
pub const NUMBERED_LIST_DIRECTIVE: &str = r"

Format your answer as a numbered Markdown list. Put each step on its own line starting with its number and a period (1., 2., 3., ...), and leave a blank line between steps.";

/// Appended to a JSON-array prompt whose first reply failed validation (`{fields}`).
pub const JSON_REPAIR_DIRECTIVE: &str = r"

IMPORTANT: your previous reply could not be parsed. Return ONLY the raw JSON array, starting with [ and ending with ]. Every element must be an object with the fields: {fields}.{extra} No prose, no markdown, no code fences, no backticks. If you cannot comply, reply with an empty array: []";

/// Appended to a numbered-list prompt whose first reply failed validation.
pub const LIST_REPAIR_DIRECTIVE: &str = r"

IMPORTANT: your previous reply was not a numbered list. Reply ONLY with a numbered Markdown list, one step per line, with a blank line between steps, exactly like this example:

1. First step

2. Second step";

/// Questions that ask for steps or a procedure.
static STEP_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(steps?|step-by-step|procedures?)\b").expect("static regex is valid")
});

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Whether a free-text question is asking for a procedure.
#[must_use]
pub fn has_step_intent(text: &str) -> bool {
    STEP_INTENT.is_match(text)
}

/// Builds generation and repair prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    flashcard_count: u32,
    quiz_count: u32,
    company_question_count: u32,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from(&PromptSettings::default())
    }
}

impl From<&PromptSettings> for PromptBuilder {
    fn from(settings: &PromptSettings) -> Self {
        Self {
            flashcard_count: settings.flashcard_count,
            quiz_count: settings.quiz_count,
            company_question_count: settings.company_question_count,
        }
    }
}

impl PromptBuilder {
    /// Builder with 6 flashcards, 5 quiz questions and 100 interview questions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the request for `task_kind` about `topic`.
    ///
    /// # Errors
    /// Returns [`ForgeError::EmptyTopic`] if `topic` is blank.
    pub fn build(&self, task_kind: TaskKind, topic: &str) -> Result<GenerationRequest, ForgeError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ForgeError::EmptyTopic);
        }

        let count = match task_kind {
            TaskKind::Flashcards => self.flashcard_count,
            TaskKind::Quiz => self.quiz_count,
            TaskKind::CompanyQuestions => self.company_question_count,
            TaskKind::FreeText | TaskKind::StepList => 0,
        }
        .to_string();
        let vars = [("count", count.as_str()), ("topic", topic)];

        let (prompt, shape) = match task_kind {
            TaskKind::Flashcards => (
                render_template(FLASHCARDS_TEMPLATE, &vars),
                task_kind.default_shape(),
            ),
            TaskKind::Quiz => (render_template(QUIZ_TEMPLATE, &vars), task_kind.default_shape()),
            TaskKind::CompanyQuestions => (
                render_template(COMPANY_QUESTIONS_TEMPLATE, &vars),
                task_kind.default_shape(),
            ),
            TaskKind::StepList => (
                render_template(STEP_LIST_TEMPLATE, &vars) + NUMBERED_LIST_DIRECTIVE,
                ExpectedShape::NumberedList,
            ),
            TaskKind::FreeText => {
                let prompt = render_template(FREE_TEXT_TEMPLATE, &vars);
                if has_step_intent(topic) {
                    (prompt + NUMBERED_LIST_DIRECTIVE, ExpectedShape::NumberedList)
                } else {
                    (prompt, ExpectedShape::Any)
                }
            }
        };

        Ok(GenerationRequest::new(task_kind, prompt, shape))
    }

    /// The original prompt with a corrective instruction for `shape` appended.
    ///
    /// `Any` never fails validation, so its prompt is returned unchanged.
    #[must_use]
    pub fn strengthen(&self, prompt: &str, shape: ExpectedShape) -> String {
        match shape {
            ExpectedShape::Any => prompt.to_string(),
            ExpectedShape::NumberedList => format!("{prompt}{LIST_REPAIR_DIRECTIVE}"),
            ExpectedShape::JsonArray(schema) => {
                let fields = schema
                    .required_fields()
                    .iter()
                    .map(|f| format!("\"{f}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                let extra = match schema {
                    Schema::QuizItem => {
                        " \"options\" must hold exactly 4 strings and \"correctAnswer\" must be exactly one of them."
                    }
                    Schema::Flashcard | Schema::CompanyQuestion => "",
                };
                let vars = [("fields", fields.as_str()), ("extra", extra)];
                let directive = render_template(JSON_REPAIR_DIRECTIVE, &vars);
                format!("{prompt}{directive}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_rendering_works() {
        let rendered = render_template(
            "Hello {name}, you are a {role}.",
            &[("name", "Ada"), ("role", "student")],
        );
        assert_eq!(rendered, "Hello Ada, you are a student.");
    }

    #[test]
    fn template_handles_missing_vars() {
        let rendered = render_template("Hello {name}, {unknown}.", &[("name", "Ada")]);
        assert_eq!(rendered, "Hello Ada, {unknown}.");
    }

    #[test]
    fn blank_topic_is_rejected() {
        let builder = PromptBuilder::new();
        for kind in TaskKind::all() {
            assert!(matches!(builder.build(*kind, "   "), Err(ForgeError::EmptyTopic)));
        }
    }

    #[test]
    fn flashcard_prompt_embeds_count_topic_and_contract() {
        let request = PromptBuilder::new()
            .build(TaskKind::Flashcards, "  Photosynthesis ")
            .expect("build");
        assert_eq!(request.expected_shape, ExpectedShape::JsonArray(Schema::Flashcard));
        assert!(request.prompt.contains("exactly 6 flashcards"));
        assert!(request.prompt.contains("\"Photosynthesis\""));
        assert!(request.prompt.contains("\"question\""));
        assert!(request.prompt.contains("\"answer\""));
        assert!(request.prompt.contains("Return ONLY a JSON array"));
        assert!(request.prompt.contains("backticks"));
        assert!(!request.prompt.contains("{count}"));
    }

    #[test]
    fn quiz_prompt_states_option_contract() {
        let request = PromptBuilder::new().build(TaskKind::Quiz, "Rust").expect("build");
        assert!(request.prompt.contains("exactly 5 questions"));
        assert!(request.prompt.contains("exactly 4"));
        assert!(request.prompt.contains("\"correctAnswer\""));
        assert!(request.prompt.contains("\"explanation\""));
    }

    #[test]
    fn company_prompt_asks_for_a_hundred() {
        let request = PromptBuilder::new()
            .build(TaskKind::CompanyQuestions, "Acme Corp")
            .expect("build");
        assert!(request.prompt.contains("at least 100"));
        assert_eq!(
            request.expected_shape,
            ExpectedShape::JsonArray(Schema::CompanyQuestion)
        );
    }

    #[test]
    fn counts_come_from_settings() {
        let builder = PromptBuilder::from(&PromptSettings {
            flashcard_count: 12,
            quiz_count: 3,
            company_question_count: 150,
        });
        let request = builder.build(TaskKind::Flashcards, "x").expect("build");
        assert!(request.prompt.contains("exactly 12 flashcards"));
    }

    #[test]
    fn step_questions_become_numbered_lists() {
        let builder = PromptBuilder::new();
        for question in [
            "What are the steps to bake bread?",
            "Walk me through the STEP-BY-STEP process",
            "Describe the procedure for titration",
        ] {
            let request = builder.build(TaskKind::FreeText, question).expect("build");
            assert_eq!(request.expected_shape, ExpectedShape::NumberedList, "{question}");
            assert!(request.prompt.contains("numbered Markdown list"));
            assert!(request.prompt.contains("blank line"));
        }
    }

    #[test]
    fn plain_questions_stay_free_text() {
        let request = PromptBuilder::new()
            .build(TaskKind::FreeText, "Why is the sky blue?")
            .expect("build");
        assert_eq!(request.expected_shape, ExpectedShape::Any);
        assert!(!request.prompt.contains("numbered"));
        // "stepped" is not a step request.
        let request = PromptBuilder::new()
            .build(TaskKind::FreeText, "Who stepped on the moon first?")
            .expect("build");
        assert_eq!(request.expected_shape, ExpectedShape::Any);
    }

    #[test]
    fn step_list_kind_always_numbered() {
        let request = PromptBuilder::new()
            .build(TaskKind::StepList, "change a tyre")
            .expect("build");
        assert_eq!(request.expected_shape, ExpectedShape::NumberedList);
        assert!(request.prompt.contains("change a tyre"));
    }

    #[test]
    fn json_repair_appends_strict_directive() {
        let repaired = PromptBuilder::new()
            .strengthen("ORIGINAL", ExpectedShape::JsonArray(Schema::QuizItem));
        assert!(repaired.starts_with("ORIGINAL"));
        assert!(repaired.contains("Return ONLY the raw JSON array"));
        assert!(repaired.contains("\"question\", \"options\", \"correctAnswer\", \"explanation\""));
        assert!(repaired.contains("exactly 4 strings"));
        assert!(repaired.contains("empty array: []"));
        assert!(!repaired.contains("{fields}"));
        assert!(!repaired.contains("{extra}"));
    }

    #[test]
    fn list_repair_shows_an_example() {
        let repaired = PromptBuilder::new().strengthen("ORIGINAL", ExpectedShape::NumberedList);
        assert!(repaired.contains("1. First step"));
        assert!(repaired.contains("2. Second step"));
    }

    #[test]
    fn any_shape_is_not_strengthened() {
        assert_eq!(PromptBuilder::new().strengthen("same", ExpectedShape::Any), "same");
    }
}
