//! LLM provider factory.
//!
//! This module creates LLM clients from the generation configuration. Creating
//! a client also checks that the configured model is available, which makes
//! client creation the "model load" step of the generative strategy.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use crate::types::ProviderType;
use docqa_core::config::GenerationConfig;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create and verify an LLM client for the configured provider.
///
/// # Errors
/// Returns error if:
/// - Provider is unknown (`AppError::Config`)
/// - The provider is unreachable or the model is missing (`AppError::ModelUnavailable`)
pub async fn connect_client(config: &GenerationConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&config.provider).ok_or_else(|| {
        AppError::Config(format!("Unknown generation provider: {}", config.provider))
    })?;

    match provider {
        ProviderType::Ollama => {
            let client = OllamaClient::with_timeout(
                config.endpoint_or_default(),
                Duration::from_secs(config.timeout_secs),
            )?;
            client.check_model(&config.model).await?;
            tracing::debug!(
                "Connected to {} (model: {})",
                provider.as_str(),
                config.model
            );
            Ok(Arc::new(client))
        }
    }
}
