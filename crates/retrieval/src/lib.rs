//! Document question answering over a single in-memory document.
//!
//! The pipeline splits a document into overlapping chunks, embeds them,
//! searches the chunk vectors exactly by squared L2 distance and hands the
//! nearest chunks to an answer strategy. All state lives in an explicit
//! [`RetrievalSession`]; nothing is persisted.

pub mod answer;
pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod session;
pub mod text;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use answer::{AnswerSelector, AnswerStrategy};
pub use embeddings::{Embedder, EmbeddingProvider};
pub use index::DocumentIndex;
pub use session::RetrievalSession;
pub use types::{AskOutcome, Chunk, IndexStats, RetrievedChunk, SessionState};
pub use vector_index::{FlatL2Index, SearchHit, VectorIndex};

pub use docqa_core::{AppError, AppResult};
