//! Chunks command handler.
//!
//! Previews how a document is split, without embedding it.

use super::document::{read_document, DocumentArgs};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_retrieval::chunker::chunk_document;

/// Preview how a document is chunked
#[derive(Args, Debug)]
pub struct ChunksCommand {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunksCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let text = read_document(&self.doc.document).await?;
        let chunking = &config.chunking;
        let windows = chunk_document(&text, chunking.chunk_size, chunking.chunk_overlap);

        if self.json {
            let chunks: Vec<_> = windows
                .iter()
                .enumerate()
                .map(|(id, w)| {
                    serde_json::json!({
                        "id": id,
                        "start": w.char_range.0,
                        "end": w.char_range.1,
                        "text": w.text,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "chunkSize": chunking.chunk_size,
                "chunkOverlap": chunking.chunk_overlap,
                "chunks": chunks,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!(
            "{} chunks (size {}, overlap {})",
            windows.len(),
            chunking.chunk_size,
            chunking.chunk_overlap
        );
        for (id, window) in windows.iter().enumerate() {
            println!(
                "--- chunk {} [{}..{}] ---",
                id, window.char_range.0, window.char_range.1
            );
            println!("{}", window.text);
        }

        Ok(())
    }
}
