//! Error types for docqa.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, model access, retrieval, prompt
//! rendering and internal invariant violations.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions return `Result<T, AppError>`.
/// Retrieval and answer failures are converted into user-facing answers at the
/// session boundary; only `Invariant` errors are meant to escape it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Chunking, embedding and search errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An embedding or generation model could not be initialized
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// An embedding or generation call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Retrieval was requested before a document with content was indexed
    #[error("No document has been indexed")]
    NoDocument,

    /// A question was empty or too short to run retrieval
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    /// Internal invariant violation (dimension mismatch, chunk/vector count divergence)
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error indicates a bug rather than an environmental failure.
    pub fn is_invariant(&self) -> bool {
        matches!(self, AppError::Invariant(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
