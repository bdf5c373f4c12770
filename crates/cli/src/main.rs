//! docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Answers questions about a single text document.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ChunksCommand, SearchCommand};
use docqa_core::{config::AppConfig, logging, AnswerStrategyKind, AppResult};
use std::path::PathBuf;

/// docqa - question answering over a single document
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a text document", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Answer strategy (extractive, generative)
    #[arg(short, long, global = true)]
    strategy: Option<AnswerStrategyKind>,

    /// Embedding provider (trigram, ollama)
    #[arg(long, global = true)]
    embedding_provider: Option<String>,

    /// Embedding model identifier (defaults to the provider's model)
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer one question about a document
    Ask(AskCommand),

    /// Show the chunks nearest to a query
    Search(SearchCommand),

    /// Ask questions interactively
    Chat(ChatCommand),

    /// Preview how a document is chunked
    Chunks(ChunksCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file and environment
    let config = AppConfig::load_from(cli.config)?;

    // Apply CLI overrides
    let config = config
        .with_overrides(
            cli.log_level,
            cli.verbose,
            cli.no_color,
            cli.strategy,
            cli.model,
        )
        .with_embedding_overrides(cli.embedding_provider, cli.embedding_model);

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docqa starting");
    tracing::debug!("Answer strategy: {}", config.answer.strategy.as_str());
    tracing::debug!(
        "Embedding: {} ({})",
        config.embedding.provider,
        config.embedding.model
    );

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Chat(_) => "chat",
        Commands::Chunks(_) => "chunks",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Chunks(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
