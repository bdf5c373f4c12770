//! Answer selection from retrieved context.
//!
//! The strategy is chosen once when the selector is built and used for every
//! question of the session.

pub mod extractive;
pub mod generative;

pub use extractive::ExtractiveStrategy;
pub use generative::GenerativeStrategy;

use async_trait::async_trait;
use docqa_core::{AnswerStrategyKind, AppConfig, AppResult};

/// Answer returned when the retrieved context is empty.
pub const NO_CONTENT_MESSAGE: &str = "No relevant content found in the document.";

/// Produces an answer string from a question and its retrieved context.
///
/// Strategies never fail: model and generation errors are reported as
/// answer text.
#[async_trait]
pub trait AnswerStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn answer(&self, question: &str, context: &str) -> String;
}

/// The answer strategy of a session.
pub struct AnswerSelector {
    kind: AnswerStrategyKind,
    strategy: Box<dyn AnswerStrategy>,
}

impl AnswerSelector {
    /// Build the strategy named by `answer.strategy`.
    ///
    /// The generative strategy loads its prompt definition here; its model
    /// is connected on first use.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let kind = config.answer.strategy;
        let strategy: Box<dyn AnswerStrategy> = match kind {
            AnswerStrategyKind::Extractive => {
                Box::new(ExtractiveStrategy::new(config.answer.max_context_chars))
            }
            AnswerStrategyKind::Generative => Box::new(GenerativeStrategy::from_config(
                &config.generation,
                config.answer.max_context_chars,
            )?),
        };

        tracing::debug!("Answer strategy: {}", kind.as_str());
        Ok(Self { kind, strategy })
    }

    /// Extractive selector with the given context limit.
    pub fn extractive(max_context_chars: usize) -> Self {
        Self::with_strategy(
            AnswerStrategyKind::Extractive,
            Box::new(ExtractiveStrategy::new(max_context_chars)),
        )
    }

    /// Selector around a custom strategy.
    pub fn with_strategy(kind: AnswerStrategyKind, strategy: Box<dyn AnswerStrategy>) -> Self {
        Self { kind, strategy }
    }

    pub fn kind(&self) -> AnswerStrategyKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    pub async fn answer(&self, question: &str, context: &str) -> String {
        self.strategy.answer(question, context).await
    }
}

impl std::fmt::Debug for AnswerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSelector")
            .field("kind", &self.kind)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}
