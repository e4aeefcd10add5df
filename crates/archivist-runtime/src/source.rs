//! Document sources: where OCR text comes from.
//!
//! The core only ever sees the returned text. Lookup and retrieval failures
//! are explicit errors so extraction never runs on absent text.

use std::path::{Path, PathBuf};

use archivist_core::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// A collaborator that can find documents by name and return their text.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Resolve a human-facing document name to a source-specific id.
    async fn find_document(&self, name: &str) -> Result<String>;

    /// Full OCR text of a document.
    async fn fetch_text(&self, id: &str) -> Result<String>;
}

/// Plain-text files in a directory; the id is the file name.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    async fn find_document(&self, name: &str) -> Result<String> {
        let exact = format!("{}.txt", name);
        if tokio::fs::try_exists(self.root.join(&exact)).await? {
            return Ok(exact);
        }

        // Fall back to a case-insensitive stem match.
        let wanted = name.to_lowercase();
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            Error::Source(format!("Cannot read {}: {}", self.root.display(), e))
        })?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_txt = path.extension().and_then(|e| e.to_str()) == Some("txt");
            let stem = path.file_stem().and_then(|s| s.to_str()).map(str::to_lowercase);
            if is_txt && stem.as_deref() == Some(wanted.as_str()) {
                let id = entry.file_name().to_string_lossy().into_owned();
                debug!("Matched document '{}' to {}", name, id);
                return Ok(id);
            }
        }

        Err(Error::Source(format!(
            "Document '{}' not found in {}",
            name,
            self.root.display()
        )))
    }

    async fn fetch_text(&self, id: &str) -> Result<String> {
        let path = self.root.join(id);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Source(format!("Failed to read {}: {}", path.display(), e)))?;

        if text.trim().is_empty() {
            return Err(Error::Source(format!(
                "Document {} contains no readable text",
                id
            )));
        }
        info!("Fetched {} ({} chars)", id, text.chars().count());
        Ok(text)
    }
}
