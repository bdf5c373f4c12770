//! End-to-end tests for retrieval sessions.


use crate::answer::AnswerSelector;
use crate::embeddings::providers::trigram::TrigramProvider;
use crate::embeddings::{Embedder, EmbeddingProvider};
use crate::session::RetrievalSession;
use docqa_core::config::{ChunkingConfig, RetrievalConfig};
use docqa_core::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trigram embeddings with hooks for failure injection.
#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    inner: TrigramProvider,
    calls: AtomicUsize,
    fail_on: Option<&'static str>,
    wide: AtomicBool,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            inner: TrigramProvider::new(64),
            calls: AtomicUsize::new(0),
            fail_on: None,
            wide: AtomicBool::new(false),
            delay: None,
        }
    }

    /// Fail every batch containing `needle`.
    pub(crate) fn failing_on(mut self, needle: &'static str) -> Self {
        self.fail_on = Some(needle);
        self
    }

    /// Sleep before every batch.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make later vectors wider than earlier ones.
    pub(crate) fn widen(&self) {
        self.wide.store(true, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(needle) = self.fail_on {
            if texts.iter().any(|t| t.contains(needle)) {
                return Err(AppError::Retrieval(format!("cannot embed '{}'", needle)));
            }
        }

        let mut vectors = self.inner.embed_batch(texts).await?;
        if self.wide.load(Ordering::SeqCst) {
            for v in &mut vectors {
                v.extend([0.0; 4]);
            }
        }
        Ok(vectors)
    }
}

/// Session with extractive answers over `provider`.
pub(crate) fn session_with(
    provider: Arc<ScriptedProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> RetrievalSession {
    RetrievalSession::new(
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        },
        RetrievalConfig::default(),
        Arc::new(Embedder::with_provider(provider)),
        AnswerSelector::extractive(3000),
    )
}

/// A document of numbered, lexically distinct sentences.
pub(crate) fn numbered_document(sentences: usize) -> String {
    const SUBJECTS: &[&str] = &[
        "harbor", "glacier", "orchard", "library", "volcano", "meadow", "canyon", "lantern",
    ];

    (0..sentences)
        .map(|i| {
            format!(
                "Sentence {} talks about the {} near the river.",
                i,
                SUBJECTS[i % SUBJECTS.len()]
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}
