//! Ollama Embedding Provider
//!
//! Provides embeddings via Ollama's local API using models like nomic-embed-text.
//!
//! # Features
//! - Local-first (no API costs)
//! - Connectivity check at construction, which also discovers the dimensions
//! - Automatic retry with exponential backoff

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docqa_core::config::EmbeddingConfig;
use docqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Maximum attempts for a single embedding request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider and verify that the model answers.
    ///
    /// The vector length of the verification call fixes the dimensions
    /// expected from every later call.
    ///
    /// # Errors
    /// * `AppError::ModelUnavailable` - If Ollama is not reachable or the model is missing
    pub async fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let mut provider = Self::unverified(config)?;
        provider.dimensions = Some(provider.verify_connection().await?);
        Ok(provider)
    }

    fn unverified(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Llm(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.endpoint_or_default().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: None,
        })
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify_connection(&self) -> AppResult<usize> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        match self.embed_with_retries("test connection").await {
            Ok(embedding) if embedding.is_empty() => Err(AppError::ModelUnavailable(format!(
                "Ollama model '{}' returned an empty embedding. Is it an embedding model?",
                self.model
            ))),
            Ok(embedding) => {
                debug!(
                    "Ollama connection verified, model '{}' ready ({} dimensions)",
                    self.model,
                    embedding.len()
                );
                Ok(embedding.len())
            }
            Err(e) => Err(AppError::ModelUnavailable(format!(
                "Ollama not available at {} ({}). Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                self.base_url, e, self.model, self.model
            ))),
        }
    }

    async fn embed_with_retries(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut attempt = 0;

        loop {
            match self.embed_single(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(e);
                    }

                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_RETRIES, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);

            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        if let Some(expected) = self.dimensions {
            if body.embedding.len() != expected {
                return Err(AppError::Invariant(format!(
                    "Ollama model '{}' returned {} dimensions, expected {}",
                    self.model,
                    body.embedding.len(),
                    expected
                )));
            }
        }

        Ok(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions.unwrap_or(0)
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // Ollama's embeddings endpoint takes one prompt per request
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                let Some(dimensions) = self.dimensions else {
                    return Err(AppError::Invariant(format!(
                        "Ollama model '{}' was used before its dimensions were known",
                        self.model
                    )));
                };
                warn!("Embedding empty text at index {} as a zero vector", i);
                embeddings.push(vec![0.0; dimensions]);
                continue;
            }

            embeddings.push(self.embed_with_retries(text).await?);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            endpoint: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_unavailable() {
        let err = OllamaProvider::new(&unreachable_config()).await.unwrap_err();

        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(err.to_string().contains("ollama pull nomic-embed-text"));
    }

    #[tokio::test]
    async fn test_empty_texts_become_zero_vectors() {
        let mut provider = OllamaProvider::unverified(&unreachable_config()).unwrap();
        provider.dimensions = Some(768);

        let embeddings = provider
            .embed_batch(&["".to_string(), "  ".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 768));
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[tokio::test]
    async fn test_dimensions_unknown_until_verified() {
        let provider = OllamaProvider::unverified(&unreachable_config()).unwrap();
        assert_eq!(provider.dimensions(), 0);

        let err = provider.embed_batch(&["".to_string()]).await.unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = EmbeddingConfig {
            endpoint: Some("http://localhost:11434/".to_string()),
            ..unreachable_config()
        };

        let provider = OllamaProvider::unverified(&config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }
}
