//! # quizforge-core
//!
//! Network-free core of the quizforge generation pipeline.
//!
//! A user asks for study material on a topic; a language model answers with
//! text that is *supposed* to be a JSON array of flashcards or quiz items, or
//! a numbered list of steps. This crate owns everything about that contract
//! that does not touch the network:
//!
//! - **Types**: task kinds, expected shapes, item schemas, results
//! - **Extraction**: pulling a JSON array out of a chatty reply
//! - **Shape validation**: schema checks and numbered-list detection
//! - **Invalid-response log**: bounded records of rejected replies
//! - **Fallback policy**: placeholder items for callers that want them
//! - **Config & counters**: `quizforge.toml` and pipeline metrics
//!
//! The model call and the validate-then-repair loop live in `quizforge-llm`.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod invalid_log;
pub mod metrics;
pub mod shape;
pub mod types;

pub use config::ForgeConfig;
pub use error::ForgeError;
pub use shape::{ShapeError, ShapeValidator};
pub use types::*;
