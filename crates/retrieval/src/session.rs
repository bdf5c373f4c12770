//! Retrieval session: one indexed document and the questions asked about it.
//!
//! Indexing builds a new [`DocumentIndex`] off to the side and publishes it
//! with a pointer swap, so questions always run against a complete index.
//! Index builds are serialized; queries run concurrently on snapshots.

use crate::answer::AnswerSelector;
use crate::embeddings::Embedder;
use crate::index::DocumentIndex;
use crate::types::{AskOutcome, IndexStats, RetrievedChunk, SessionState};
use docqa_core::config::{ChunkingConfig, RetrievalConfig};
use docqa_core::{AppConfig, AppError, AppResult};
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A single-document question answering session.
pub struct RetrievalSession {
    id: Uuid,
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
    embedder: Arc<Embedder>,
    answerer: AnswerSelector,
    published: RwLock<Option<Arc<DocumentIndex>>>,
    indexing: tokio::sync::Mutex<()>,
}

impl RetrievalSession {
    /// Create a session from validated configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        Ok(Self::new(
            config.chunking.clone(),
            config.retrieval.clone(),
            Arc::new(Embedder::from_config(&config.embedding)),
            AnswerSelector::from_config(config)?,
        ))
    }

    /// Create a session from its parts.
    pub fn new(
        chunking: ChunkingConfig,
        retrieval: RetrievalConfig,
        embedder: Arc<Embedder>,
        answerer: AnswerSelector,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, strategy = answerer.kind().as_str(), "Session created");

        Self {
            id,
            chunking,
            retrieval,
            embedder,
            answerer,
            published: RwLock::new(None),
            indexing: tokio::sync::Mutex::new(()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn answerer(&self) -> &AnswerSelector {
        &self.answerer
    }

    /// `Ready` once a document with at least one chunk is published.
    pub fn state(&self) -> SessionState {
        match self.ready_snapshot() {
            Some(_) => SessionState::Ready,
            None => SessionState::Empty,
        }
    }

    /// Statistics of the published index.
    pub fn stats(&self) -> Option<IndexStats> {
        self.snapshot().map(|index| index.stats().clone())
    }

    /// The published index.
    pub fn document(&self) -> Option<Arc<DocumentIndex>> {
        self.snapshot()
    }

    /// Chunk, embed and index `text`, replacing the current document.
    ///
    /// On error the previously published document stays in place.
    #[instrument(skip(self, text), fields(session_id = %self.id, chars = text.len()))]
    pub async fn index_document(&self, text: &str) -> AppResult<IndexStats> {
        let _guard = self.indexing.lock().await;

        let index = DocumentIndex::build(text, &self.chunking, &self.embedder).await?;
        let stats = index.stats().clone();

        self.publish(Some(Arc::new(index)));

        info!(
            "Indexed document: {} chunks in {:.2}s",
            stats.chunk_count, stats.duration_secs
        );
        Ok(stats)
    }

    /// Drop the published document.
    pub async fn reset(&self) {
        let _guard = self.indexing.lock().await;
        self.publish(None);
        info!(session_id = %self.id, "Session reset");
    }

    /// The `k` chunks nearest to `question`, ascending by distance.
    ///
    /// Fails with [`AppError::NoDocument`] while the session is empty, before
    /// the question is looked at, then with [`AppError::InvalidQuestion`].
    #[instrument(skip(self, question), fields(session_id = %self.id))]
    pub async fn search(&self, question: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        let index = self.ready_snapshot().ok_or(AppError::NoDocument)?;
        self.validate_question(question)?;
        self.search_in(&index, question, k).await
    }

    /// Texts of the `k` chunks nearest to `question`. Errors as [`Self::search`].
    pub async fn query(&self, question: &str, k: usize) -> AppResult<Vec<String>> {
        Ok(self
            .search(question, k)
            .await?
            .into_iter()
            .map(|hit| hit.chunk.text)
            .collect())
    }

    /// Answer `question` from the published document.
    ///
    /// Only internal invariant violations are returned as errors; model and
    /// retrieval failures become [`AskOutcome::Failed`] or an error answer.
    #[instrument(skip(self, question), fields(session_id = %self.id))]
    pub async fn ask(&self, question: &str) -> AppResult<AskOutcome> {
        // a single snapshot serves the checks and the retrieval
        let Some(index) = self.ready_snapshot() else {
            return Ok(AskOutcome::NoDocument);
        };
        if self.validate_question(question).is_err() {
            return Ok(AskOutcome::InvalidQuestion);
        }

        let hits = self
            .search_in(&index, question, self.retrieval.top_k)
            .await;
        let chunks: Vec<String> = match hits {
            Ok(hits) => hits.into_iter().map(|hit| hit.chunk.text).collect(),
            Err(e) if e.is_invariant() => return Err(e),
            Err(e) => {
                warn!("Retrieval failed: {}", e);
                return Ok(AskOutcome::Failed(format!(
                    "Could not search the document: {}",
                    e
                )));
            }
        };

        let context = chunks.join(" ");
        let answer = self.answerer.answer(question.trim(), &context).await;

        info!(
            strategy = self.answerer.name(),
            chunks = chunks.len(),
            "Answered question"
        );
        Ok(AskOutcome::Answered(answer))
    }

    async fn search_in(
        &self,
        index: &DocumentIndex,
        question: &str,
        k: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let query = self.embedder.embed_query(question).await?;
        index.search(&query, k)
    }

    fn validate_question(&self, question: &str) -> AppResult<()> {
        let chars = question.trim().chars().count();
        if chars < self.retrieval.min_question_chars {
            return Err(AppError::InvalidQuestion(format!(
                "question has {} characters, at least {} required",
                chars, self.retrieval.min_question_chars
            )));
        }
        Ok(())
    }

    fn snapshot(&self) -> Option<Arc<DocumentIndex>> {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn ready_snapshot(&self) -> Option<Arc<DocumentIndex>> {
        self.snapshot().filter(|index| !index.is_empty())
    }

    fn publish(&self, index: Option<Arc<DocumentIndex>>) {
        *self
            .published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = index;
    }
}

impl std::fmt::Debug for RetrievalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("embedder", &self.embedder)
            .field("answerer", &self.answerer)
            .finish()
    }
}
