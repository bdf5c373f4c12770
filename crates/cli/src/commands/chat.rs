//! Chat command handler.
//!
//! Interactive question loop over one session. Lines starting with `:` are
//! commands; anything else is a question.

use super::document::{describe, index_file, DocumentArgs};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_retrieval::RetrievalSession;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands: :load FILE, :stats, :quit. Anything else is a question.";

/// Ask questions interactively
#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(flatten)]
    pub doc: DocumentArgs,
}

/// A parsed chat line.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Load(PathBuf),
    Stats,
    Help,
    Quit,
    Question(String),
    Skip,
}

fn parse_line(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Skip;
    }

    let Some(command) = line.strip_prefix(':') else {
        return ChatInput::Question(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "load" if !arg.is_empty() => ChatInput::Load(PathBuf::from(arg)),
        "stats" => ChatInput::Stats,
        "quit" | "q" | "exit" => ChatInput::Quit,
        _ => ChatInput::Help,
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let session = RetrievalSession::from_config(config)?;
        let stats = index_file(&session, &self.doc.document).await?;
        println!("Loaded {}: {}", self.doc.document.display(), describe(&stats));
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_line(&line) {
                ChatInput::Skip => continue,
                ChatInput::Quit => break,
                ChatInput::Help => println!("{}", HELP),
                ChatInput::Stats => match session.stats() {
                    Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
                    None => println!("No document loaded."),
                },
                ChatInput::Load(path) => match index_file(&session, &path).await {
                    Ok(stats) => println!("Loaded {}: {}", path.display(), describe(&stats)),
                    Err(e) if e.is_invariant() => return Err(e),
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", path.display(), e);
                        println!("Could not load {}: {}", path.display(), e);
                    }
                },
                ChatInput::Question(question) => {
                    let outcome = session.ask(&question).await?;
                    println!("{}", outcome);
                }
            }
        }

        Ok(())
    }
}
