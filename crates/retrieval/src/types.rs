//! Retrieval type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answer returned when no document (or an empty one) has been indexed.
pub const NO_DOCUMENT_MESSAGE: &str = "Please upload a document first.";

/// Answer returned for empty or trivially short questions.
pub const INVALID_QUESTION_MESSAGE: &str = "Please ask a valid question about the uploaded document.";

/// A text chunk of the indexed document.
///
/// The chunk's vector lives in the index's vector storage and is reachable
/// through [`crate::DocumentIndex::vector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within the document (0-indexed)
    pub id: u32,

    /// Trimmed text content
    pub text: String,

    /// Character range of the window in the source text
    pub char_range: (usize, usize),
}

/// A chunk returned by a search, with its squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Statistics recorded when a document is indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// SHA-256 of the source text
    pub document_hash: String,

    /// Source length in characters
    pub document_chars: usize,

    /// Number of chunks created
    pub chunk_count: usize,

    /// Chunk window size used
    pub chunk_size: usize,

    /// Chunk overlap used
    pub chunk_overlap: usize,

    /// Vector dimensions (None when no chunk was embedded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    /// Embedding provider and model (None when the model was never loaded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// When the index was published
    pub indexed_at: DateTime<Utc>,

    /// Build duration in seconds
    pub duration_secs: f64,
}

/// Lifecycle of a retrieval session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No document with content is indexed
    Empty,
    /// A document is indexed and questions are served
    Ready,
}

/// Caller-facing result of asking a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// An answer was produced (possibly an error answer from the generative model)
    Answered(String),
    /// No document has been indexed yet
    NoDocument,
    /// The question was rejected before retrieval
    InvalidQuestion,
    /// Retrieval failed; the message explains why
    Failed(String),
}

impl AskOutcome {
    /// User-facing text for this outcome.
    pub fn message(&self) -> &str {
        match self {
            Self::Answered(answer) => answer.as_str(),
            Self::NoDocument => NO_DOCUMENT_MESSAGE,
            Self::InvalidQuestion => INVALID_QUESTION_MESSAGE,
            Self::Failed(reason) => reason.as_str(),
        }
    }

    /// Short machine-readable status.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Answered(_) => "answered",
            Self::NoDocument => "no_document",
            Self::InvalidQuestion => "invalid_question",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for AskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
