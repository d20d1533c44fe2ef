//! Default-value policy for callers whose generation failed outright.
//!
//! The pipeline never invents content. A caller that would rather show
//! something than an error (a UI rendering a deck, say) asks this module
//! for a placeholder that still satisfies the task's schema.

use crate::types::{
    CompanyQuestion, Flashcard, Payload, QuizItem, StudyItem, TaskKind, ValidatedResult,
};

/// Warning attached to placeholder results.
pub const FALLBACK_WARNING: &str =
    "Generation failed; showing placeholder content. Please try again.";

/// Schema-valid placeholder items for `task_kind` and `topic`.
///
/// Text-shaped task kinds have no items and return an empty vector.
#[must_use]
pub fn fallback_items(task_kind: TaskKind, topic: &str) -> Vec<StudyItem> {
    let topic = topic.trim();
    match task_kind {
        TaskKind::Flashcards => vec![StudyItem::Flashcard(Flashcard {
            question: format!("What is {topic}?"),
            answer: format!(
                "We couldn't generate flashcards for \"{topic}\" right now. Please try again."
            ),
        })],
        TaskKind::Quiz => {
            let retry = "Try generating the quiz again".to_string();
            vec![StudyItem::Quiz(QuizItem {
                question: format!("The quiz for \"{topic}\" could not be generated. What now?"),
                options: vec![
                    retry.clone(),
                    "Pick a different topic".to_string(),
                    "Review your flashcards".to_string(),
                    "Take a break".to_string(),
                ],
                correct_answer: retry,
                explanation: "The question generator was unavailable.".to_string(),
            })]
        }
        TaskKind::CompanyQuestions => vec![StudyItem::CompanyQuestion(CompanyQuestion {
            question: format!("Tell me about yourself and why you want to work at {topic}."),
            answer: "Summarise your background, connect it to the role, and explain what \
                     draws you to the company."
                .to_string(),
        })],
        TaskKind::FreeText | TaskKind::StepList => Vec::new(),
    }
}

/// A warned placeholder result for `task_kind` and `topic`.
#[must_use]
pub fn fallback_result(task_kind: TaskKind, topic: &str) -> ValidatedResult {
    let payload = match task_kind {
        TaskKind::FreeText | TaskKind::StepList => Payload::Text(format!(
            "Sorry, I couldn't generate an answer about \"{}\" right now. Please try again.",
            topic.trim()
        )),
        _ => Payload::Items(fallback_items(task_kind, topic)),
    };
    ValidatedResult {
        payload,
        warning: Some(FALLBACK_WARNING.to_string()),
    }
}
