//! Ask command handler.
//!
//! Indexes a document and answers one question about it.

use super::document::{open_session, DocumentArgs};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Answer one question about a document
#[derive(Args, Debug)]
pub struct AskCommand {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let session = open_session(config, &self.doc.document).await?;
        let outcome = session.ask(&self.question).await?;

        if self.json {
            let stats = session.stats();
            let output = serde_json::json!({
                "question": self.question,
                "status": outcome.status(),
                "answer": outcome.message(),
                "strategy": session.answerer().kind().as_str(),
                "sessionId": session.id().to_string(),
                "document": {
                    "path": self.doc.document.display().to_string(),
                    "chunks": stats.as_ref().map(|s| s.chunk_count),
                    "hash": stats.as_ref().map(|s| s.document_hash.clone()),
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", outcome);
        }

        Ok(())
    }
}
