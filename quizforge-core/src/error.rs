//! Error types for the quizforge core library.

use thiserror::Error;

use crate::shape::ShapeError;

/// Top-level error type for core quizforge operations.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The topic or question was empty after trimming.
    #[error("Topic must not be empty")]
    EmptyTopic,

    /// Reply text did not conform to the expected shape.
    #[error("Shape validation failed: {0}")]
    Shape(#[from] ShapeError),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ForgeError>;
