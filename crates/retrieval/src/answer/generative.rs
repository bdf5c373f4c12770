//! Generative answers from a text-generation model.

use super::{AnswerStrategy, NO_CONTENT_MESSAGE};
use crate::text::truncate_chars;
use async_trait::async_trait;
use docqa_core::config::GenerationConfig;
use docqa_core::{AppError, AppResult, LazyResource, LoadState};
use docqa_llm::{connect_client, LlmClient, LlmRequest};
use docqa_prompt::{build_answer_prompt, load_prompt_file, PromptDefinition};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

/// Answer returned when the model produced only whitespace.
pub const NO_CLEAR_ANSWER_MESSAGE: &str = "Sorry, I couldn't find a clear answer in the document.";

type ClientConnector =
    Box<dyn Fn() -> BoxFuture<'static, AppResult<Arc<dyn LlmClient>>> + Send + Sync>;

/// Renders the answer prompt and asks the generation model.
///
/// The model client is connected on first use; a failed connection is
/// reported in the answer and retried on the next question.
pub struct GenerativeStrategy {
    client: LazyResource<Arc<dyn LlmClient>>,
    connector: ClientConnector,
    prompt: PromptDefinition,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    max_context_chars: usize,
}

impl GenerativeStrategy {
    /// Strategy connecting to the configured provider.
    ///
    /// Fails only when `prompt_file` is set and cannot be loaded.
    pub fn from_config(config: &GenerationConfig, max_context_chars: usize) -> AppResult<Self> {
        let prompt = match &config.prompt_file {
            Some(path) => load_prompt_file(path)?,
            None => PromptDefinition::default_answer(),
        };

        let connect_config = config.clone();
        let strategy = Self::with_connector(config, max_context_chars, move || {
            let config = connect_config.clone();
            async move { connect_client(&config).await }.boxed()
        });

        Ok(strategy.with_prompt(prompt))
    }

    /// Strategy using a custom client connector.
    pub fn with_connector<F>(config: &GenerationConfig, max_context_chars: usize, connector: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, AppResult<Arc<dyn LlmClient>>> + Send + Sync + 'static,
    {
        Self {
            client: LazyResource::new("generation model"),
            connector: Box::new(connector),
            prompt: PromptDefinition::default_answer(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            max_context_chars,
        }
    }

    /// Replace the prompt definition.
    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    /// Load state of the generation client.
    pub fn state(&self) -> LoadState {
        self.client.state()
    }

    async fn client(&self) -> AppResult<Arc<dyn LlmClient>> {
        let timeout = self.timeout;
        let client = self
            .client
            .get_or_try_load(|| async move {
                tokio::time::timeout(timeout, (self.connector)())
                    .await
                    .map_err(|_| {
                        AppError::Timeout(format!("connecting took longer than {:?}", timeout))
                    })?
            })
            .await?;

        Ok(Arc::clone(client))
    }

    async fn generate(&self, client: &dyn LlmClient, question: &str, context: &str) -> AppResult<String> {
        let context = truncate_chars(context, self.max_context_chars);
        let prompt = build_answer_prompt(&self.prompt, question, context)?;
        tracing::debug!(
            prompt_id = %prompt.source_prompt_id,
            context_chars = context.chars().count(),
            "Rendered answer prompt"
        );

        let mut request = LlmRequest::new(prompt.user, &self.model)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = tokio::time::timeout(self.timeout, client.complete(&request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!("generation took longer than {:?}", self.timeout))
            })??;

        tracing::debug!(
            "Generated {} chars with {} ({} tokens)",
            response.content.len(),
            response.model,
            response.usage.completion_tokens
        );

        Ok(response.content)
    }
}

#[async_trait]
impl AnswerStrategy for GenerativeStrategy {
    fn name(&self) -> &'static str {
        "generative"
    }

    async fn answer(&self, question: &str, context: &str) -> String {
        if context.trim().is_empty() {
            return NO_CONTENT_MESSAGE.to_string();
        }

        let client = match self.client().await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Generation model unavailable: {}", e);
                return format!("Answer model unavailable: {}", reason(&e));
            }
        };

        match self.generate(client.as_ref(), question, context).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    NO_CLEAR_ANSWER_MESSAGE.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(e) => {
                tracing::warn!("Answer generation failed: {}", e);
                format!("Answer generation failed: {}", reason(&e))
            }
        }
    }
}

/// Error text without the category prefix.
fn reason(err: &AppError) -> String {
    match err {
        AppError::ModelUnavailable(r)
        | AppError::Timeout(r)
        | AppError::Llm(r)
        | AppError::Prompt(r) => r.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_llm::{LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Echoes a canned reply and records the last request.
    #[derive(Default)]
    struct CannedClient {
        reply: String,
        delay: Option<Duration>,
        last_request: Mutex<Option<LlmRequest>>,
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn check_model(&self, _model: &str) -> AppResult<()> {
            Ok(())
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
                done: true,
            })
        }
    }

    fn strategy_with(client: Arc<CannedClient>, config: &GenerationConfig) -> GenerativeStrategy {
        GenerativeStrategy::with_connector(config, 3000, move || {
            let client: Arc<dyn LlmClient> = client.clone();
            async move { Ok(client) }.boxed()
        })
    }

    #[tokio::test]
    async fn test_answer_from_model() {
        let client = Arc::new(CannedClient {
            reply: "  On the mat.\n".to_string(),
            ..Default::default()
        });
        let strategy = strategy_with(client.clone(), &GenerationConfig::default());

        let answer = strategy
            .answer("Where did the cat sit?", "The cat sat on the mat.")
            .await;
        assert_eq!(answer, "On the mat.");

        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "llama3.2");
        assert_eq!(request.max_tokens, Some(250));
        assert_eq!(request.temperature, Some(0.7));
        assert!(request.prompt.starts_with("Answer this question in detail"));
        assert!(request.prompt.contains("Context:\nThe cat sat on the mat."));
        assert!(request.prompt.ends_with("Question: Where did the cat sit?\n\nAnswer:"));
    }

    #[tokio::test]
    async fn test_empty_generation() {
        let client = Arc::new(CannedClient {
            reply: " \n ".to_string(),
            ..Default::default()
        });
        let strategy = strategy_with(client, &GenerationConfig::default());

        let answer = strategy.answer("What?", "Some context.").await;
        assert_eq!(answer, NO_CLEAR_ANSWER_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_context_skips_model() {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connects);
        let strategy =
            GenerativeStrategy::with_connector(&GenerationConfig::default(), 3000, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Llm("unreachable".to_string())) }.boxed()
            });

        assert_eq!(strategy.answer("What?", "  ").await, NO_CONTENT_MESSAGE);
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_model_is_retried() {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connects);
        let strategy =
            GenerativeStrategy::with_connector(&GenerationConfig::default(), 3000, move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(AppError::ModelUnavailable("model 'llama3.2' not found".to_string()))
                    } else {
                        let client: Arc<dyn LlmClient> = Arc::new(CannedClient {
                            reply: "Yes.".to_string(),
                            ..Default::default()
                        });
                        Ok(client)
                    }
                }
                .boxed()
            });

        let first = strategy.answer("Is it?", "It is.").await;
        assert_eq!(first, "Answer model unavailable: model 'llama3.2' not found");
        assert!(matches!(strategy.state(), LoadState::Failed(_)));

        let second = strategy.answer("Is it?", "It is.").await;
        assert_eq!(second, "Yes.");
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_generation_times_out() {
        let client = Arc::new(CannedClient {
            reply: "late".to_string(),
            delay: Some(Duration::from_secs(3)),
            ..Default::default()
        });
        let config = GenerationConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let strategy = strategy_with(client, &config);

        let answer = strategy.answer("Is it?", "It is.").await;
        assert!(answer.starts_with("Answer generation failed: generation took longer than"));
    }

    #[tokio::test]
    async fn test_context_truncated_and_custom_prompt() {
        let client = Arc::new(CannedClient {
            reply: "ok".to_string(),
            ..Default::default()
        });
        let strategy = GenerativeStrategy::with_connector(&GenerationConfig::default(), 5, {
            let client = client.clone();
            move || {
                let client: Arc<dyn LlmClient> = client.clone();
                async move { Ok(client) }.boxed()
            }
        })
        .with_prompt(PromptDefinition {
            system: Some("Be brief.".to_string()),
            template: "Q={{question}} C={{context}}".to_string(),
            ..PromptDefinition::default_answer()
        });

        strategy.answer("why", "abcdefghij").await;

        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.prompt, "Q=why C=abcde");
        assert_eq!(request.system.as_deref(), Some("Be brief."));
    }
}
