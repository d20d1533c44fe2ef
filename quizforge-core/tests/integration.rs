//! Integration tests: offline flows across config, validation, logging
//! and fallback.

use std::io::BufRead;

use quizforge_core::config::ForgeConfig;
use quizforge_core::extract::{BalancedSpan, StrictSingleSpan};
use quizforge_core::fallback::{fallback_result, FALLBACK_WARNING};
use quizforge_core::invalid_log::{InvalidResponse, InvalidResponseSink, JsonlSink, LogLimits};
use quizforge_core::types::{ExpectedShape, Payload, Schema, StudyItem, TaskKind};
use quizforge_core::{ShapeError, ShapeValidator};

const TWO_ARRAYS: &str = r#"Here are two decks:
[{"question":"Q1","answer":"A1"}]
and another:
[{"question":"Q2","answer":"A2"}]"#;

// ---------------------------------------------------------------------------
// Config file → validator and log sink
// ---------------------------------------------------------------------------

#[test]
fn config_file_drives_validator_and_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("logs").join("invalid.jsonl");
    let config_path = dir.path().join("quizforge.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[validation]
enforce_answer_in_options = false
invalid_log_path = '{}'
prompt_log_chars = 10
response_log_chars = 20
"#,
            log_path.display()
        ),
    )
    .expect("write config");

    let config = ForgeConfig::from_file(&config_path).expect("load config");
    let validator =
        ShapeValidator::new().with_answer_enforcement(config.validation.enforce_answer_in_options);

    // The relaxed validator accepts a quiz whose answer is not an option.
    let quiz = r#"[{"question":"2+2?","options":["1","2","3","5"],
        "correctAnswer":"4","explanation":"Sum."}]"#;
    assert!(validator.check(quiz, ExpectedShape::JsonArray(Schema::QuizItem)).is_ok());

    // A rejected reply goes to the configured JSONL file, truncated.
    let reply = "I cannot produce JSON today, sorry about that.";
    let err = validator
        .check(reply, ExpectedShape::JsonArray(Schema::Flashcard))
        .unwrap_err();
    let log = config.validation.invalid_log_path.as_ref().expect("path");
    let sink = JsonlSink::open(log).expect("open");
    let entry = InvalidResponse::new(
        TaskKind::Flashcards,
        ExpectedShape::JsonArray(Schema::Flashcard),
        err.to_string(),
        "Create exactly 6 flashcards about rust",
        reply,
        LogLimits::from(&config.validation),
    );
    sink.record(&entry).expect("record");
    sink.record(&entry).expect("record again");

    let file = std::fs::File::open(&log_path).expect("log exists");
    let lines: Vec<String> = std::io::BufReader::new(file)
        .lines()
        .collect::<Result<_, _>>()
        .expect("read lines");
    assert_eq!(lines.len(), 2);

    let restored: InvalidResponse = serde_json::from_str(&lines[0]).expect("parse line");
    assert_eq!(restored.prompt, "Create exa");
    assert_eq!(restored.response.chars().count(), 20);
    assert_eq!(restored.task_kind, TaskKind::Flashcards);
    assert!(restored.reason.contains("no JSON array"), "{}", restored.reason);
}

// ---------------------------------------------------------------------------
// Extraction strategies
// ---------------------------------------------------------------------------

#[test]
fn extraction_strategy_decides_two_array_replies() {
    let shape = ExpectedShape::JsonArray(Schema::Flashcard);

    let widest = ShapeValidator::new().check(TWO_ARRAYS, shape);
    assert!(matches!(widest, Err(ShapeError::InvalidJson(_))));

    let balanced = ShapeValidator::new()
        .with_extractor(BalancedSpan)
        .check(TWO_ARRAYS, shape)
        .expect("first array is valid");
    match balanced {
        Payload::Items(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].question(), "Q1");
        }
        Payload::Text(_) => panic!("expected items"),
    }

    let strict = ShapeValidator::new().with_extractor(StrictSingleSpan).check(TWO_ARRAYS, shape);
    assert!(matches!(strict, Err(ShapeError::NoArrayFound)));
}

// ---------------------------------------------------------------------------
// Fallback policy
// ---------------------------------------------------------------------------

#[test]
fn fallback_items_satisfy_their_own_schema() {
    let validator = ShapeValidator::new();
    for kind in TaskKind::all() {
        let result = fallback_result(*kind, "Graph theory");
        assert_eq!(result.warning.as_deref(), Some(FALLBACK_WARNING));

        let ExpectedShape::JsonArray(schema) = kind.default_shape() else {
            assert!(result.text().is_some(), "{kind} falls back to text");
            continue;
        };
        let json = serde_json::to_string(&result.payload).expect("serialize");
        let items = validator.check_json_array(&json, schema).expect("placeholder validates");
        assert_eq!(items.len(), 1, "{kind}");
    }
}

#[test]
fn validated_quiz_serializes_in_wire_spelling() {
    let quiz = r#"Sure!
[{"question":"Capital of France?","options":["Paris","Rome","Madrid","Berlin"],
  "correctAnswer":"Paris","explanation":"Paris is the capital."}]
Good luck!"#;
    let payload = ShapeValidator::new()
        .check(quiz, ExpectedShape::JsonArray(Schema::QuizItem))
        .expect("valid quiz");
    let Payload::Items(items) = &payload else {
        panic!("expected items");
    };
    assert!(matches!(items[0], StudyItem::Quiz(_)));

    let json = serde_json::to_value(&payload).expect("serialize");
    assert_eq!(json[0]["correctAnswer"], "Paris");
    assert_eq!(json[0]["options"].as_array().map(Vec::len), Some(4));
}
