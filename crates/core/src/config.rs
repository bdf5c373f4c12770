//! Configuration management for docqa.
//!
//! This module handles loading and merging configuration from multiple sources,
//! in increasing order of precedence:
//! - Built-in defaults
//! - Config file (`--config`, `DOCQA_CONFIG`, or `./docqa.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Configuration is resolved once at startup and injected into the retrieval
//! session; nothing re-reads it per question.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "docqa.yaml";

/// Default Ollama endpoint used when none is configured.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Model reported by the built-in trigram embedder.
pub const DEFAULT_TRIGRAM_MODEL: &str = "trigram-v1";

/// Embedding model used when the ollama provider is selected without one.
pub const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";

const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];
const KNOWN_GENERATION_PROVIDERS: [&str; 1] = ["ollama"];

/// How answers are produced from retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStrategyKind {
    /// Lexical-overlap sentence selection, no model required
    #[default]
    Extractive,
    /// Delegate to a text-generation model
    Generative,
}

impl AnswerStrategyKind {
    /// Parse a strategy name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "extractive" => Some(Self::Extractive),
            "generative" => Some(Self::Generative),
            _ => None,
        }
    }

    /// Get the canonical strategy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extractive => "extractive",
            Self::Generative => "generative",
        }
    }
}

impl std::str::FromStr for AnswerStrategyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            AppError::Config(format!(
                "Unknown answer strategy: {}. Supported: extractive, generative",
                s
            ))
        })
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Document chunking parameters
    pub chunking: ChunkingConfig,

    /// Query-time retrieval parameters
    pub retrieval: RetrievalConfig,

    /// Embedding provider settings
    pub embedding: EmbeddingConfig,

    /// Answer selection settings
    pub answer: AnswerConfig,

    /// Generative answer settings (only used by the generative strategy)
    pub generation: GenerationConfig,
}

/// Chunking parameters. Sizes are counted in Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    #[serde(rename = "chunkSize")]
    pub chunk_size: usize,

    /// Characters shared by adjacent windows
    #[serde(rename = "chunkOverlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Query-time retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer strategy
    #[serde(rename = "topK")]
    pub top_k: usize,

    /// Questions shorter than this (after trimming) are rejected
    #[serde(rename = "minQuestionChars")]
    pub min_question_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_question_chars: 3,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Vector dimensions of the trigram provider; ollama models report their own
    pub dimensions: usize,

    /// Whether the trigram provider normalizes to unit length
    pub normalize: bool,

    /// Maximum number of texts per embedding request
    #[serde(rename = "batchSize")]
    pub batch_size: usize,

    /// Provider endpoint (defaults to `OLLAMA_URL` or localhost)
    pub endpoint: Option<String>,

    /// Time budget for one embedding call
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: DEFAULT_TRIGRAM_MODEL.to_string(),
            dimensions: 384,
            normalize: true,
            batch_size: 100,
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// Default model of a known embedding provider.
    pub fn default_model_for(provider: &str) -> Option<&'static str> {
        match provider {
            "trigram" => Some(DEFAULT_TRIGRAM_MODEL),
            "ollama" => Some(DEFAULT_OLLAMA_EMBEDDING_MODEL),
            _ => None,
        }
    }

    /// Switch provider. A model still at the old provider's default follows
    /// the switch; an explicitly chosen model is kept.
    pub fn set_provider(&mut self, provider: impl Into<String>) {
        let provider = provider.into();
        let model_is_default = self.model.is_empty()
            || Self::default_model_for(&self.provider) == Some(self.model.as_str());

        if model_is_default {
            if let Some(model) = Self::default_model_for(&provider) {
                self.model = model.to_string();
            }
        }
        self.provider = provider;
    }

    /// Endpoint to use for HTTP-backed providers.
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }
}

/// Answer selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Strategy used for every question of the session
    pub strategy: AnswerStrategyKind,

    /// Retrieved context is cut to this many characters before answering
    #[serde(rename = "maxContextChars")]
    pub max_context_chars: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            strategy: AnswerStrategyKind::Extractive,
            max_context_chars: 3000,
        }
    }
}

/// Generative answer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// LLM provider name
    pub provider: String,

    /// Provider endpoint (defaults to `OLLAMA_URL` or localhost)
    pub endpoint: Option<String>,

    /// Generation model identifier
    pub model: String,

    /// Maximum tokens to generate
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Time budget for one generation call
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,

    /// Optional YAML prompt definition replacing the built-in template
    #[serde(rename = "promptFile")]
    pub prompt_file: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: None,
            model: "llama3.2".to_string(),
            max_tokens: 250,
            temperature: 0.7,
            timeout_secs: 60,
            prompt_file: None,
        }
    }
}

impl GenerationConfig {
    /// Endpoint to use for the generation provider.
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    logging: Option<LoggingConfig>,
    chunking: Option<ChunkingConfig>,
    retrieval: Option<RetrievalConfig>,
    embedding: Option<EmbeddingConfig>,
    answer: Option<AnswerConfig>,
    generation: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            answer: AnswerConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the default config file and the environment.
    ///
    /// Environment variables:
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_ANSWER_STRATEGY`: "extractive" or "generative"
    /// - `DOCQA_EMBEDDING_PROVIDER`: Embedding provider
    /// - `DOCQA_EMBEDDING_MODEL`: Embedding model identifier
    /// - `DOCQA_GENERATION_MODEL`: Generation model identifier
    /// - `OLLAMA_URL`: Endpoint for Ollama-backed providers
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Strategy: {}", config.answer.strategy.as_str());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration, merging the given config file if provided.
    pub fn load_from(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let config_path = config_file
            .or_else(|| std::env::var("DOCQA_CONFIG").ok().map(PathBuf::from))
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            config = config.merge_yaml(&path)?;
        }

        // Environment variables override YAML config
        if let Ok(strategy) = std::env::var("DOCQA_ANSWER_STRATEGY") {
            config.answer.strategy = strategy.parse()?;
        }

        if let Ok(provider) = std::env::var("DOCQA_EMBEDDING_PROVIDER") {
            config.embedding.set_provider(provider);
        }

        if let Ok(model) = std::env::var("DOCQA_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        if let Ok(model) = std::env::var("DOCQA_GENERATION_MODEL") {
            config.generation.model = model;
        }

        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.embedding.endpoint.get_or_insert_with(|| url.clone());
            config.generation.endpoint.get_or_insert(url);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(answer) = config_file.answer {
            result.answer = answer;
        }
        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and config file.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        strategy: Option<AnswerStrategyKind>,
        generation_model: Option<String>,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if let Some(strategy) = strategy {
            self.answer.strategy = strategy;
        }

        if let Some(model) = generation_model {
            self.generation.model = model;
        }

        self
    }

    /// Apply CLI embedding overrides. The provider is applied first so an
    /// explicit model wins over the provider's default.
    pub fn with_embedding_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
    ) -> Self {
        if let Some(provider) = provider {
            self.embedding.set_provider(provider);
        }

        if let Some(model) = model {
            self.embedding.model = model;
        }

        self
    }

    /// Validate the configuration before a session is built from it.
    pub fn validate(&self) -> AppResult<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be positive".to_string()));
        }

        let embedding = &self.embedding;
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }
        if embedding.model.trim().is_empty() {
            return Err(AppError::Config("Embedding model cannot be empty".to_string()));
        }
        if embedding.provider != "trigram" && embedding.model == DEFAULT_TRIGRAM_MODEL {
            return Err(AppError::Config(format!(
                "Embedding model '{}' only exists for the trigram provider. Set embedding.model or --embedding-model for {}",
                DEFAULT_TRIGRAM_MODEL, embedding.provider
            )));
        }
        if embedding.dimensions == 0 || embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding dimensions and batchSize must be positive".to_string(),
            ));
        }
        if embedding.timeout_secs == 0 {
            return Err(AppError::Config(
                "Embedding timeoutSecs must be positive".to_string(),
            ));
        }

        if self.answer.max_context_chars == 0 {
            return Err(AppError::Config(
                "maxContextChars must be positive".to_string(),
            ));
        }

        // Generation settings only matter when the generative strategy is active
        if self.answer.strategy == AnswerStrategyKind::Generative {
            let generation = &self.generation;
            if !KNOWN_GENERATION_PROVIDERS.contains(&generation.provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown generation provider: {}. Supported: {}",
                    generation.provider,
                    KNOWN_GENERATION_PROVIDERS.join(", ")
                )));
            }
            if !(0.0..=2.0).contains(&generation.temperature) {
                return Err(AppError::Config(format!(
                    "temperature must be within 0.0-2.0, got {}",
                    generation.temperature
                )));
            }
            if generation.timeout_secs == 0 {
                return Err(AppError::Config(
                    "Generation timeoutSecs must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }
}
