use std::path::PathBuf;

use anyhow::Context;
use ask_domain::{HistoryEntry, trim_history};
use tracing::{debug, warn};

/// Chat history kept as JSON Lines, one entry per line.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads every entry. A missing file is an empty history; lines that do
    /// not parse are skipped.
    pub async fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read history from {}", self.path.display()))?;

        let entries: Vec<HistoryEntry> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(line = index + 1, %error, path = %self.path.display(), "Skipping invalid history line");
                    None
                }
            })
            .collect();
        debug!(count = entries.len(), "Loaded history");
        Ok(entries)
    }

    /// Appends `new` and rewrites the file with at most `max` entries.
    pub async fn append(&self, new: Vec<HistoryEntry>, max: usize) -> anyhow::Result<()> {
        let mut entries = self.load().await?;
        entries.extend(new);
        trim_history(&mut entries, max);

        let mut content = String::new();
        for entry in &entries {
            content.push_str(&serde_json::to_string(entry).context("Failed to serialize history entry")?);
            content.push('\n');
        }
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write history to {}", self.path.display()))
    }
}
