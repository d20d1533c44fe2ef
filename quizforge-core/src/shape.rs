//! Shape validation of model replies.
//!
//! A reply is checked against an [`ExpectedShape`]:
//!   - `Any`: always accepted.
//!   - `JsonArray(schema)`: an array is extracted from the text, parsed, and
//!     every element must carry the schema's required fields.
//!   - `NumberedList`: at least half of the non-empty lines (minimum one)
//!     must look like `1. item` or `1.- item`.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::extract::{ArrayExtractor, WidestSpan};
use crate::types::{
    CompanyQuestion, ExpectedShape, Flashcard, Payload, QuizItem, Schema, StudyItem,
};

/// Integer, a dot, then whitespace or a dash.
static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.[\s-]").expect("static regex is valid"));

/// Why a reply failed shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// No bracketed span was found in the reply.
    #[error("no JSON array found in reply")]
    NoArrayFound,

    /// The extracted span is not valid JSON.
    #[error("extracted span is not valid JSON: {0}")]
    InvalidJson(String),

    /// The extracted JSON is not an array.
    #[error("extracted JSON is not an array")]
    NotAnArray,

    /// An array element is not a JSON object.
    #[error("element {index} is not an object")]
    NotAnObject {
        /// Element position.
        index: usize,
    },

    /// A required field is absent or empty.
    #[error("element {index} is missing required field '{field}'")]
    MissingField {
        /// Element position.
        index: usize,
        /// Wire name of the field.
        field: &'static str,
    },

    /// A required field has the wrong JSON type.
    #[error("element {index} has field '{field}' of the wrong type")]
    WrongType {
        /// Element position.
        index: usize,
        /// Wire name of the field.
        field: &'static str,
    },

    /// A quiz item does not have exactly the required number of options.
    #[error("element {index} has {found} options (expected {expected})")]
    OptionCount {
        /// Element position.
        index: usize,
        /// Options present.
        found: usize,
        /// Options required.
        expected: usize,
    },

    /// A quiz item's correct answer is not one of its options.
    #[error("element {index} has a correct answer that is not among its options")]
    AnswerNotInOptions {
        /// Element position.
        index: usize,
    },

    /// Too few lines look like numbered list items.
    #[error("only {numbered} of {total} lines are numbered (need {required})")]
    TooFewNumberedLines {
        /// Lines that matched.
        numbered: usize,
        /// Non-empty lines in the reply.
        total: usize,
        /// Lines needed to pass.
        required: usize,
    },
}

/// Validates reply text against an expected shape.
///
/// Cheap to clone; the extractor is shared.
#[derive(Clone)]
pub struct ShapeValidator {
    extractor: Arc<dyn ArrayExtractor>,
    enforce_answer_in_options: bool,
}

impl std::fmt::Debug for ShapeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeValidator")
            .field("extractor", &self.extractor.name())
            .field("enforce_answer_in_options", &self.enforce_answer_in_options)
            .finish()
    }
}

impl Default for ShapeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeValidator {
    /// Widest-span extraction, correct answers must match an option.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractor: Arc::new(WidestSpan),
            enforce_answer_in_options: true,
        }
    }

    /// Swap the array extraction strategy.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl ArrayExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Toggle the quiz correct-answer consistency check.
    #[must_use]
    pub fn with_answer_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_answer_in_options = enforce;
        self
    }

    /// Check `text` against `shape`, returning the payload on success.
    ///
    /// # Errors
    /// Returns the first [`ShapeError`] encountered.
    pub fn check(&self, text: &str, shape: ExpectedShape) -> Result<Payload, ShapeError> {
        match shape {
            ExpectedShape::Any => Ok(Payload::Text(text.to_string())),
            ExpectedShape::NumberedList => {
                check_numbered_list(text)?;
                Ok(Payload::Text(text.to_string()))
            }
            ExpectedShape::JsonArray(schema) => {
                self.check_json_array(text, schema).map(Payload::Items)
            }
        }
    }

    /// Extract, parse and schema-check a JSON array.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] describing the first violation.
    pub fn check_json_array(
        &self,
        text: &str,
        schema: Schema,
    ) -> Result<Vec<StudyItem>, ShapeError> {
        let span = self.extractor.extract(text).ok_or(ShapeError::NoArrayFound)?;
        let value: Value =
            serde_json::from_str(span).map_err(|e| ShapeError::InvalidJson(e.to_string()))?;
        let Value::Array(elements) = value else {
            return Err(ShapeError::NotAnArray);
        };

        elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let object = element.as_object().ok_or(ShapeError::NotAnObject { index })?;
                self.check_element(index, object, schema)
            })
            .collect()
    }

    fn check_element(
        &self,
        index: usize,
        object: &Map<String, Value>,
        schema: Schema,
    ) -> Result<StudyItem, ShapeError> {
        match schema {
            Schema::Flashcard => Ok(StudyItem::Flashcard(Flashcard {
                question: required_str(object, index, "question")?,
                answer: required_str(object, index, "answer")?,
            })),
            Schema::CompanyQuestion => Ok(StudyItem::CompanyQuestion(CompanyQuestion {
                question: required_str(object, index, "question")?,
                answer: required_str(object, index, "answer")?,
            })),
            Schema::QuizItem => {
                let question = required_str(object, index, "question")?;
                let options = required_options(object, index, schema)?;
                let correct_answer = required_str(object, index, "correctAnswer")?;
                let explanation = required_str(object, index, "explanation")?;

                if self.enforce_answer_in_options
                    && !options.iter().any(|o| o.trim() == correct_answer.trim())
                {
                    return Err(ShapeError::AnswerNotInOptions { index });
                }

                Ok(StudyItem::Quiz(QuizItem {
                    question,
                    options,
                    correct_answer,
                    explanation,
                }))
            }
        }
    }
}

fn required_str(
    object: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ShapeError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ShapeError::MissingField { index, field }),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(ShapeError::MissingField { index, field })
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ShapeError::WrongType { index, field }),
    }
}

fn required_options(
    object: &Map<String, Value>,
    index: usize,
    schema: Schema,
) -> Result<Vec<String>, ShapeError> {
    const FIELD: &str = "options";
    let values = match object.get(FIELD) {
        None | Some(Value::Null) => return Err(ShapeError::MissingField { index, field: FIELD }),
        Some(Value::Array(values)) => values,
        Some(_) => return Err(ShapeError::WrongType { index, field: FIELD }),
    };

    if let Some(expected) = schema.option_count() {
        if values.len() != expected {
            return Err(ShapeError::OptionCount {
                index,
                found: values.len(),
                expected,
            });
        }
    }

    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or(ShapeError::WrongType { index, field: FIELD })
        })
        .collect()
}

/// Check that enough lines of `text` are numbered list items.
///
/// Lines are trimmed and blank lines dropped. At least `max(1, lines / 2)`
/// lines must start with an integer, a `.`, then whitespace or `-`.
///
/// # Errors
/// Returns [`ShapeError::TooFewNumberedLines`] when the threshold is missed.
pub fn check_numbered_list(text: &str) -> Result<(), ShapeError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let numbered = lines.iter().filter(|line| is_numbered_line(line)).count();
    let required = (lines.len() / 2).max(1);

    if numbered >= required {
        Ok(())
    } else {
        Err(ShapeError::TooFewNumberedLines {
            numbered,
            total: lines.len(),
            required,
        })
    }
}

/// Whether a trimmed line starts like `12. ` or `3.-`.
#[must_use]
pub fn is_numbered_line(line: &str) -> bool {
    NUMBERED_LINE.is_match(line)
}
