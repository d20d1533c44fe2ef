//! Core types shared by the prompt builder, model client and validator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Task kinds and shapes
// ---------------------------------------------------------------------------

/// What the caller is asking the model to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Chat-style explanation or open question.
    FreeText,
    /// A deck of question/answer flashcards.
    Flashcards,
    /// Multiple-choice quiz with four options per question.
    Quiz,
    /// A large bank of interview questions for a company or role.
    CompanyQuestions,
    /// An explicit step-by-step procedure.
    StepList,
}

impl TaskKind {
    /// The shape a reply to this task kind must satisfy.
    ///
    /// Free-text asks start as [`ExpectedShape::Any`]; the prompt builder
    /// upgrades them to a numbered list when the question asks for steps.
    #[must_use]
    pub fn default_shape(self) -> ExpectedShape {
        match self {
            Self::FreeText => ExpectedShape::Any,
            Self::Flashcards => ExpectedShape::JsonArray(Schema::Flashcard),
            Self::Quiz => ExpectedShape::JsonArray(Schema::QuizItem),
            Self::CompanyQuestions => ExpectedShape::JsonArray(Schema::CompanyQuestion),
            Self::StepList => ExpectedShape::NumberedList,
        }
    }

    /// All task kinds.
    #[must_use]
    pub fn all() -> &'static [TaskKind] {
        &[
            Self::FreeText,
            Self::Flashcards,
            Self::Quiz,
            Self::CompanyQuestions,
            Self::StepList,
        ]
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FreeText => "free_text",
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::CompanyQuestions => "company_questions",
            Self::StepList => "step_list",
        };
        write!(f, "{name}")
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free_text" => Ok(Self::FreeText),
            "flashcards" => Ok(Self::Flashcards),
            "quiz" => Ok(Self::Quiz),
            "company_questions" => Ok(Self::CompanyQuestions),
            "step_list" => Ok(Self::StepList),
            _ => Err(format!("unknown task kind: '{s}'")),
        }
    }
}

/// Item schema for a JSON-array reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `{question, answer}`
    Flashcard,
    /// `{question, options[4], correctAnswer, explanation}`
    QuizItem,
    /// `{question, answer}`
    CompanyQuestion,
}

impl Schema {
    /// Field names every array element must carry, in wire spelling.
    #[must_use]
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Flashcard | Self::CompanyQuestion => &["question", "answer"],
            Self::QuizItem => &["question", "options", "correctAnswer", "explanation"],
        }
    }

    /// Number of options each item must have, if the schema has options.
    #[must_use]
    pub fn option_count(self) -> Option<usize> {
        match self {
            Self::QuizItem => Some(QUIZ_OPTION_COUNT),
            Self::Flashcard | Self::CompanyQuestion => None,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Flashcard => "flashcard",
            Self::QuizItem => "quiz_item",
            Self::CompanyQuestion => "company_question",
        };
        write!(f, "{name}")
    }
}

/// Options per quiz question.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// The structural contract a reply must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "schema")]
pub enum ExpectedShape {
    /// Anything goes.
    Any,
    /// A JSON array whose elements all satisfy the schema.
    JsonArray(Schema),
    /// A numbered Markdown list.
    NumberedList,
}

impl fmt::Display for ExpectedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::JsonArray(schema) => write!(f, "json_array<{schema}>"),
            Self::NumberedList => write!(f, "numbered_list"),
        }
    }
}

/// A single generation request, built per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// What is being produced.
    pub task_kind: TaskKind,
    /// The fully rendered prompt sent to the model.
    pub prompt: String,
    /// The shape the reply must satisfy.
    pub expected_shape: ExpectedShape,
}

impl GenerationRequest {
    /// Create a request from its parts.
    #[must_use]
    pub fn new(
        task_kind: TaskKind,
        prompt: impl Into<String>,
        expected_shape: ExpectedShape,
    ) -> Self {
        Self {
            task_kind,
            prompt: prompt.into(),
            expected_shape,
        }
    }
}

// ---------------------------------------------------------------------------
// Study items
// ---------------------------------------------------------------------------

/// A question/answer flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Front of the card.
    pub question: String,
    /// Back of the card.
    pub answer: String,
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    /// The question text.
    pub question: String,
    /// Exactly four answer options.
    pub options: Vec<String>,
    /// The option that is correct.
    pub correct_answer: String,
    /// Why the correct answer is correct.
    pub explanation: String,
}

/// An interview question with a model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyQuestion {
    /// The interview question.
    pub question: String,
    /// A model answer.
    pub answer: String,
}

/// One validated element of a JSON-array payload.
///
/// Serialized as the bare item object. Flashcards and interview questions
/// share a wire form, so items are only ever built by the validator, which
/// knows the schema; there is no `Deserialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StudyItem {
    /// A quiz question.
    Quiz(QuizItem),
    /// A flashcard.
    Flashcard(Flashcard),
    /// An interview question.
    CompanyQuestion(CompanyQuestion),
}

impl StudyItem {
    /// The question text, whatever the item kind.
    #[must_use]
    pub fn question(&self) -> &str {
        match self {
            Self::Quiz(q) => &q.question,
            Self::Flashcard(f) => &f.question,
            Self::CompanyQuestion(c) => &c.question,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The payload handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Raw text: free-text answers, numbered lists, or unvalidated fallbacks.
    Text(String),
    /// Schema-validated items.
    Items(Vec<StudyItem>),
}

/// Warning attached to results whose shape could not be validated.
pub const UNVALIDATED_WARNING: &str =
    "The model output could not be validated against the expected format; returning raw text.";

/// The only value the pipeline returns to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedResult {
    /// The payload.
    pub payload: Payload,
    /// Present when the payload is raw text that failed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ValidatedResult {
    /// A result that passed validation.
    #[must_use]
    pub fn validated(payload: Payload) -> Self {
        Self {
            payload,
            warning: None,
        }
    }

    /// A raw-text result flagged with the standard unvalidated warning.
    #[must_use]
    pub fn unvalidated(text: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(text.into()),
            warning: Some(UNVALIDATED_WARNING.to_string()),
        }
    }

    /// Whether a warning is attached.
    #[must_use]
    pub fn is_warned(&self) -> bool {
        self.warning.is_some()
    }

    /// The validated items, if the payload is structured.
    #[must_use]
    pub fn items(&self) -> Option<&[StudyItem]> {
        match &self.payload {
            Payload::Items(items) => Some(items),
            Payload::Text(_) => None,
        }
    }

    /// The raw text, if the payload is text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            Payload::Items(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_kind_from_str_round_trip() {
        for kind in TaskKind::all() {
            let parsed: TaskKind = kind.to_string().parse().expect("should parse");
            assert_eq!(*kind, parsed);
        }
        assert!("essay".parse::<TaskKind>().is_err());
    }

    #[test]
    fn structured_kinds_expect_json_arrays() {
        assert_eq!(
            TaskKind::Quiz.default_shape(),
            ExpectedShape::JsonArray(Schema::QuizItem)
        );
        assert_eq!(TaskKind::StepList.default_shape(), ExpectedShape::NumberedList);
        assert_eq!(TaskKind::FreeText.default_shape(), ExpectedShape::Any);
    }

    #[test]
    fn quiz_item_uses_camel_case_on_the_wire() {
        let item = QuizItem {
            question: "Q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".into(),
            explanation: "because".into(),
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert!(json.get("correctAnswer").is_some());
        assert!(json.get("correct_answer").is_none());
    }

    #[test]
    fn warning_is_skipped_when_absent() {
        let result = ValidatedResult::validated(Payload::Text("hello".into()));
        let json = serde_json::to_string(&result).expect("serialize");
        assert_eq!(json, r#"{"payload":"hello"}"#);
        assert!(!result.is_warned());
    }

    #[test]
    fn company_questions_keep_their_kind_and_wire_form() {
        let item = StudyItem::CompanyQuestion(CompanyQuestion {
            question: "Why us?".into(),
            answer: "Mission.".into(),
        });
        assert!(matches!(item, StudyItem::CompanyQuestion(_)));

        let result = ValidatedResult::validated(Payload::Items(vec![item]));
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "payload": [{ "question": "Why us?", "answer": "Mission." }] })
        );
    }

    #[test]
    fn unvalidated_result_carries_text_and_warning() {
        let result = ValidatedResult::unvalidated("raw");
        assert_eq!(result.text(), Some("raw"));
        assert!(result.items().is_none());
        assert!(result.is_warned());
    }
}
