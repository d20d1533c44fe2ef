//! Golden prompt set.
//!
//! Each case builds a prompt through [`PromptBuilder`] and checks the
//! strings that must (and must not) reach the model, plus the shape the
//! reply will be validated against.

use quizforge_core::types::{ExpectedShape, Schema, TaskKind};
use quizforge_llm::prompt::{self, PromptBuilder};

struct GoldenCase {
    name: &'static str,
    task_kind: TaskKind,
    topic: &'static str,
    shape: ExpectedShape,
    prompt_must_contain: Vec<&'static str>,
    prompt_must_not_contain: Vec<&'static str>,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            name: "flashcards_biology",
            task_kind: TaskKind::Flashcards,
            topic: "Cell biology",
            shape: ExpectedShape::JsonArray(Schema::Flashcard),
            prompt_must_contain: vec![
                "exactly 6 flashcards",
                "\"Cell biology\"",
                "\"question\"",
                "\"answer\"",
            ],
            prompt_must_not_contain: vec!["{count}", "{topic}", "correctAnswer"],
        },
        GoldenCase {
            name: "flashcards_topic_with_quotes",
            task_kind: TaskKind::Flashcards,
            topic: "The \"Big O\" notation",
            shape: ExpectedShape::JsonArray(Schema::Flashcard),
            prompt_must_contain: vec!["Big O", "Return ONLY a JSON array"],
            prompt_must_not_contain: vec!["{topic}"],
        },
        GoldenCase {
            name: "quiz_history",
            task_kind: TaskKind::Quiz,
            topic: "The French Revolution",
            shape: ExpectedShape::JsonArray(Schema::QuizItem),
            prompt_must_contain: vec![
                "exactly 5 questions",
                "The French Revolution",
                "exactly 4",
                "\"correctAnswer\"",
                "\"explanation\"",
            ],
            prompt_must_not_contain: vec!["{count}", "numbered Markdown list"],
        },
        GoldenCase {
            name: "company_questions",
            task_kind: TaskKind::CompanyQuestions,
            topic: "Acme Robotics",
            shape: ExpectedShape::JsonArray(Schema::CompanyQuestion),
            prompt_must_contain: vec!["at least 100", "Acme Robotics", "behavioral"],
            prompt_must_not_contain: vec!["{count}"],
        },
        GoldenCase {
            name: "free_text_plain_question",
            task_kind: TaskKind::FreeText,
            topic: "Why do leaves change colour in autumn?",
            shape: ExpectedShape::Any,
            prompt_must_contain: vec!["You are", "leaves change colour"],
            prompt_must_not_contain: vec!["numbered Markdown list", "JSON"],
        },
        GoldenCase {
            name: "free_text_asking_for_steps",
            task_kind: TaskKind::FreeText,
            topic: "What are the steps to solve a quadratic equation?",
            shape: ExpectedShape::NumberedList,
            prompt_must_contain: vec!["quadratic equation", "numbered Markdown list", "1., 2., 3."],
            prompt_must_not_contain: vec!["JSON"],
        },
        GoldenCase {
            name: "free_text_asking_for_procedure",
            task_kind: TaskKind::FreeText,
            topic: "Describe the procedure for titration",
            shape: ExpectedShape::NumberedList,
            prompt_must_contain: vec!["titration", "numbered Markdown list"],
            prompt_must_not_contain: vec![],
        },
        GoldenCase {
            name: "free_text_mentioning_footsteps_only",
            task_kind: TaskKind::FreeText,
            topic: "Who left footsteps on the moon?",
            shape: ExpectedShape::Any,
            prompt_must_contain: vec!["footsteps on the moon"],
            prompt_must_not_contain: vec!["numbered Markdown list"],
        },
        GoldenCase {
            name: "step_list_explicit",
            task_kind: TaskKind::StepList,
            topic: "setting up a Python virtual environment",
            shape: ExpectedShape::NumberedList,
            prompt_must_contain: vec![
                "step by step",
                "virtual environment",
                "blank line between steps",
            ],
            prompt_must_not_contain: vec!["{topic}"],
        },
        GoldenCase {
            name: "step_list_trims_topic",
            task_kind: TaskKind::StepList,
            topic: "   changing a tyre\n",
            shape: ExpectedShape::NumberedList,
            prompt_must_contain: vec!["step by step: changing a tyre\n"],
            prompt_must_not_contain: vec!["   changing"],
        },
    ]
}

#[test]
fn golden_prompts_render_as_expected() {
    let builder = PromptBuilder::new();

    for case in golden_cases() {
        let request = builder
            .build(case.task_kind, case.topic)
            .unwrap_or_else(|e| panic!("golden case '{}' failed to build: {e}", case.name));

        assert_eq!(
            request.expected_shape, case.shape,
            "golden case '{}' expects shape {}",
            case.name, case.shape
        );

        for needle in &case.prompt_must_contain {
            assert!(
                request.prompt.contains(needle),
                "golden case '{}': prompt must contain '{needle}'.\nPrompt:\n{}",
                case.name,
                request.prompt
            );
        }
        for needle in &case.prompt_must_not_contain {
            assert!(
                !request.prompt.contains(needle),
                "golden case '{}': prompt must NOT contain '{needle}'.\nPrompt:\n{}",
                case.name,
                request.prompt
            );
        }
    }
}

#[test]
fn golden_set_covers_every_task_kind() {
    let cases = golden_cases();
    for kind in TaskKind::all() {
        assert!(
            cases.iter().any(|case| case.task_kind == *kind),
            "no golden case for task kind {kind}"
        );
    }
}

#[test]
fn structured_templates_forbid_surrounding_prose() {
    for (name, template) in [
        ("flashcards", prompt::FLASHCARDS_TEMPLATE),
        ("quiz", prompt::QUIZ_TEMPLATE),
        ("company_questions", prompt::COMPANY_QUESTIONS_TEMPLATE),
    ] {
        assert!(template.contains("Return ONLY a JSON array"), "{name} must demand a bare array");
        assert!(template.contains("Do not write any introduction"), "{name} must forbid prose");
    }
}

#[test]
fn repair_prompts_extend_the_original() {
    let builder = PromptBuilder::new();
    for kind in TaskKind::all() {
        let request = builder.build(*kind, "photosynthesis steps").expect("build");
        let repaired = builder.strengthen(&request.prompt, request.expected_shape);
        assert!(repaired.starts_with(&request.prompt), "{kind}");
        if request.expected_shape == ExpectedShape::Any {
            assert_eq!(repaired, request.prompt);
        } else {
            assert!(repaired.contains("IMPORTANT"), "{kind}");
        }
    }
}
