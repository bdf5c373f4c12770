//! Embedding engine for the retrieval session.
//!
//! [`Embedder`] wraps an [`EmbeddingProvider`] that is loaded on first use.
//! Loading is single-flight and a failed load is retried by the next call.
//! Every call is bounded by the configured timeout and checked against the
//! dimensionality the provider declares, or the one observed on the first
//! successful call when it declares none.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use docqa_core::config::EmbeddingConfig;
use docqa_core::{AppError, AppResult, LazyResource, LoadState};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

type ProviderLoader =
    Box<dyn Fn() -> BoxFuture<'static, AppResult<Arc<dyn EmbeddingProvider>>> + Send + Sync>;

/// Lazily loaded, timeout-bounded embedding front end.
pub struct Embedder {
    provider: LazyResource<Arc<dyn EmbeddingProvider>>,
    loader: ProviderLoader,
    batch_size: usize,
    timeout: Duration,
    dimensions: OnceLock<usize>,
}

impl Embedder {
    /// Create an embedder that builds its provider from `config` on first use.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let provider_config = config.clone();
        Self::with_loader(move || {
            let config = provider_config.clone();
            async move { create_provider(&config).await }.boxed()
        })
        .with_batch_size(config.batch_size)
        .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Create an embedder around a custom provider loader.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, AppResult<Arc<dyn EmbeddingProvider>>>
            + Send
            + Sync
            + 'static,
    {
        let defaults = EmbeddingConfig::default();
        Self {
            provider: LazyResource::new("embedding model"),
            loader: Box::new(loader),
            batch_size: defaults.batch_size,
            timeout: Duration::from_secs(defaults.timeout_secs),
            dimensions: OnceLock::new(),
        }
    }

    /// Create an embedder around an already constructed provider.
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_loader(move || {
            let provider = Arc::clone(&provider);
            async move { Ok(provider) }.boxed()
        })
    }

    /// Maximum number of texts sent to the provider per call.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Time budget for loading the provider and for each batch.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load state of the underlying provider.
    pub fn state(&self) -> LoadState {
        self.provider.state()
    }

    /// Vector dimensionality, once the provider is loaded.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions.get().copied()
    }

    /// "provider/model" of the loaded provider.
    pub fn model_label(&self) -> Option<String> {
        self.provider
            .get()
            .map(|p| format!("{}/{}", p.provider_name(), p.model_name()))
    }

    /// Embed `texts`, one vector per input in input order.
    ///
    /// An empty input returns immediately without loading the provider.
    pub async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider().await?;

        tracing::debug!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            provider.provider_name(),
            provider.model_name()
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = tokio::time::timeout(self.timeout, provider.embed_batch(batch))
                .await
                .map_err(|_| {
                    AppError::Timeout(format!(
                        "embedding {} texts took longer than {:?}",
                        batch.len(),
                        self.timeout
                    ))
                })??;

            if vectors.len() != batch.len() {
                return Err(AppError::Invariant(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in &vectors {
                self.check_dimensions(vector.len())?;
            }

            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Embed a single query text.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::Retrieval("No embedding returned".to_string()))
    }

    async fn provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        let timeout = self.timeout;
        let provider = self
            .provider
            .get_or_try_load(|| async move {
                tokio::time::timeout(timeout, (self.loader)())
                    .await
                    .map_err(|_| {
                        AppError::Timeout(format!("loading took longer than {:?}", timeout))
                    })?
            })
            .await?;

        let declared = provider.dimensions();
        if declared > 0 {
            self.check_dimensions(declared)?;
        }

        Ok(Arc::clone(provider))
    }

    fn check_dimensions(&self, actual: usize) -> AppResult<()> {
        if actual == 0 {
            return Err(AppError::Invariant(
                "provider returned an empty vector".to_string(),
            ));
        }

        let expected = *self.dimensions.get_or_init(|| actual);
        if expected != actual {
            return Err(AppError::Invariant(format!(
                "embedding dimension changed from {} to {}",
                expected, actual
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("provider", &self.provider)
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::trigram::TrigramProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every batch it receives; vectors encode the text length.
    #[derive(Debug, Default)]
    struct RecordingProvider {
        batches: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for RecordingProvider {
        fn provider_name(&self) -> &str {
            "recording"
        }

        fn model_name(&self) -> &str {
            "len-v1"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    #[derive(Debug)]
    struct SlowProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for SlowProvider {
        fn provider_name(&self) -> &str {
            "slow"
        }

        fn model_name(&self) -> &str {
            "slow"
        }

        fn dimensions(&self) -> usize {
            1
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![vec![0.0]; texts.len()])
        }
    }

    /// Returns vectors whose dimension grows with the text length.
    #[derive(Debug)]
    struct RaggedProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for RaggedProvider {
        fn provider_name(&self) -> &str {
            "ragged"
        }

        fn model_name(&self) -> &str {
            "ragged"
        }

        fn dimensions(&self) -> usize {
            0
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![1.0; t.len().max(1)]).collect())
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_input_does_not_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let embedder = Embedder::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Arc::new(TrigramProvider::new(16)) as Arc<dyn EmbeddingProvider>) }.boxed()
        });

        let vectors = embedder.embed(&[]).await.unwrap();

        assert!(vectors.is_empty());
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert_eq!(embedder.state(), LoadState::NotLoaded);
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let provider = Arc::new(RecordingProvider::default());
        let embedder = Embedder::with_provider(provider.clone()).with_batch_size(2);

        let vectors = embedder
            .embed(&texts(&["a", "bb", "ccc", "dddd", "eeeee"]))
            .await
            .unwrap();

        let lengths: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(*provider.batches.lock().unwrap(), vec![2, 2, 1]);
        assert_eq!(embedder.dimensions(), Some(2));
        assert_eq!(embedder.model_label().as_deref(), Some("recording/len-v1"));
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let embedder = Embedder::with_loader(move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(AppError::Llm("connection refused".to_string()))
                } else {
                    Ok(Arc::new(TrigramProvider::new(16)) as Arc<dyn EmbeddingProvider>)
                }
            }
            .boxed()
        });

        let err = embedder.embed_query("first").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(matches!(embedder.state(), LoadState::Failed(_)));

        let vector = embedder.embed_query("second").await.unwrap();
        assert_eq!(vector.len(), 16);
        assert_eq!(embedder.state(), LoadState::Ready);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_batch_times_out() {
        let embedder = Embedder::with_provider(Arc::new(SlowProvider))
            .with_timeout(Duration::from_millis(50));

        let err = embedder.embed(&texts(&["anything"])).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert!(!err.is_invariant());
    }

    #[tokio::test]
    async fn test_dimension_change_is_invariant() {
        let embedder = Embedder::with_provider(Arc::new(RaggedProvider));

        embedder.embed_query("abc").await.unwrap();
        let err = embedder.embed_query("abcdef").await.unwrap_err();

        assert!(err.is_invariant());
        assert_eq!(embedder.dimensions(), Some(3));
    }

    #[tokio::test]
    async fn test_vectors_must_match_declared_dimensions() {
        /// Declares 8 dimensions but returns 2.
        #[derive(Debug)]
        struct MisdeclaredProvider;

        #[async_trait::async_trait]
        impl EmbeddingProvider for MisdeclaredProvider {
            fn provider_name(&self) -> &str {
                "misdeclared"
            }

            fn model_name(&self) -> &str {
                "misdeclared"
            }

            fn dimensions(&self) -> usize {
                8
            }

            async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
                Ok(vec![vec![1.0, 0.0]; texts.len()])
            }
        }

        let embedder = Embedder::with_provider(Arc::new(MisdeclaredProvider));

        let err = embedder.embed_query("anything").await.unwrap_err();
        assert!(err.is_invariant());
        assert_eq!(embedder.dimensions(), Some(8));
    }

    #[tokio::test]
    async fn test_from_config_uses_trigram() {
        let config = EmbeddingConfig {
            dimensions: 64,
            ..Default::default()
        };
        let embedder = Embedder::from_config(&config);

        let vectors = embedder.embed(&texts(&["hello world", "rust"])).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(embedder.dimensions(), Some(64));
        assert_eq!(embedder.model_label().as_deref(), Some("trigram/trigram-v1"));
    }
}
