//! Loading the document a command works on.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_retrieval::{IndexStats, RetrievalSession};
use std::path::{Path, PathBuf};

/// The document to answer questions about.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// UTF-8 text file to index
    #[arg(short, long)]
    pub document: PathBuf,
}

/// Read a UTF-8 document.
pub async fn read_document(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Config(format!("Cannot read document {}: {}", path.display(), e))
    })
}

/// Create a session from `config` and index the document at `path`.
pub async fn open_session(config: &AppConfig, path: &Path) -> AppResult<RetrievalSession> {
    let session = RetrievalSession::from_config(config)?;
    index_file(&session, path).await?;
    Ok(session)
}

/// Index the document at `path` into `session`.
pub async fn index_file(session: &RetrievalSession, path: &Path) -> AppResult<IndexStats> {
    let text = read_document(path).await?;
    tracing::info!("Indexing {} ({} bytes)", path.display(), text.len());
    session.index_document(&text).await
}

/// One-line summary of an indexed document.
pub fn describe(stats: &IndexStats) -> String {
    format!(
        "{} chunks from {} chars in {:.2}s",
        stats.chunk_count, stats.document_chars, stats.duration_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_retrieval::SessionState;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_open_session_indexes_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "The cat sat on the mat. The dog ran in the park.").unwrap();

        let session = open_session(&AppConfig::default(), file.path()).await.unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert!(describe(&session.stats().unwrap()).starts_with("1 chunks"));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let err = read_document(Path::new("/nonexistent/doc.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Cannot read document"));
    }
}
