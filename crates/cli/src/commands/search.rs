//! Search command handler.
//!
//! Shows the chunks nearest to a query with their distances.

use super::document::{open_session, DocumentArgs};
use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_retrieval::types::NO_DOCUMENT_MESSAGE;

/// Show the chunks nearest to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let session = open_session(config, &self.doc.document).await?;
        let k = self.top_k.unwrap_or(config.retrieval.top_k);
        let hits = match session.search(&self.query, k).await {
            Ok(hits) => hits,
            Err(AppError::NoDocument) => {
                println!("{}", NO_DOCUMENT_MESSAGE);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "k": k,
                "results": hits,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No chunks found.");
            return Ok(());
        }

        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{}. chunk {} (distance {:.4})",
                rank + 1,
                hit.chunk.id,
                hit.distance
            );
            println!("   {}", hit.chunk.text.replace('\n', " "));
            println!();
        }

        Ok(())
    }
}
