//! Immutable per-document index: chunks plus their vectors.

use crate::chunker::chunk_document;
use crate::embeddings::Embedder;
use crate::types::{Chunk, IndexStats, RetrievedChunk};
use crate::vector_index::{FlatL2Index, VectorIndex};
use chrono::Utc;
use docqa_core::config::ChunkingConfig;
use docqa_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::time::Instant;

/// SHA-256 fingerprint of a document's text.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Chunks of one document and the vector index over them.
///
/// Chunk `i` is stored at vector position `i`. The index is never mutated
/// after construction; re-indexing builds a new one.
#[derive(Debug)]
pub struct DocumentIndex {
    chunks: Vec<Chunk>,
    vectors: Box<dyn VectorIndex>,
    stats: IndexStats,
}

impl DocumentIndex {
    /// Assemble an index from chunks and a vector index built over them.
    pub fn new(chunks: Vec<Chunk>, vectors: Box<dyn VectorIndex>, stats: IndexStats) -> AppResult<Self> {
        if chunks.len() != vectors.len() {
            return Err(AppError::Invariant(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        Ok(Self {
            chunks,
            vectors,
            stats,
        })
    }

    /// Chunk `text`, embed every chunk and index the vectors.
    ///
    /// Text without any non-whitespace content yields an empty index and
    /// never touches the embedder.
    pub async fn build(text: &str, chunking: &ChunkingConfig, embedder: &Embedder) -> AppResult<Self> {
        let start = Instant::now();

        let chunks: Vec<Chunk> = chunk_document(text, chunking.chunk_size, chunking.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, window)| Chunk {
                id: i as u32,
                text: window.text,
                char_range: window.char_range,
            })
            .collect();

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;

        let mut vectors = FlatL2Index::new();
        vectors.build(embeddings)?;

        let stats = IndexStats {
            document_hash: fingerprint(text),
            document_chars: text.chars().count(),
            chunk_count: chunks.len(),
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            dimensions: vectors.dimensions(),
            embedding_model: if chunks.is_empty() {
                None
            } else {
                embedder.model_label()
            },
            indexed_at: Utc::now(),
            duration_secs: start.elapsed().as_secs_f64(),
        };

        Self::new(chunks, Box::new(vectors), stats)
    }

    /// The `k` chunks nearest to `query`, ascending by distance.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<RetrievedChunk>> {
        self.vectors
            .search(query, k)?
            .into_iter()
            .map(|hit| {
                let chunk = self.chunks.get(hit.position).ok_or_else(|| {
                    AppError::Invariant(format!("search hit {} has no chunk", hit.position))
                })?;
                Ok(RetrievedChunk {
                    chunk: chunk.clone(),
                    distance: hit.distance,
                })
            })
            .collect()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Vector of the chunk with the given id.
    pub fn vector(&self, id: u32) -> Option<&[f32]> {
        self.vectors.vector(id as usize)
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}
