//! Query history.
//!
//! The most recent successful queries, newest first, kept in a JSON file
//! under the user's data directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Number of entries kept.
pub const MAX_HISTORY_ENTRIES: usize = 20;

/// Errors reading or writing the history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The file could not be read or written.
    #[error("history file error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not hold a history list.
    #[error("history file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// One executed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique id, the creation time in milliseconds.
    pub id: String,
    /// The SQL text as submitted.
    pub query: String,
    /// When the query ran.
    pub timestamp: DateTime<Utc>,
    /// Reported execution time in milliseconds.
    #[serde(default)]
    pub execution_time: Option<u64>,
    /// Number of rows returned.
    #[serde(default)]
    pub row_count: Option<usize>,
}

/// Bounded, newest-first query history.
#[derive(Debug, Default)]
pub struct QueryHistory {
    path: Option<PathBuf>,
    entries: Vec<HistoryEntry>,
}

impl QueryHistory {
    /// A history that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the history stored at `path`.
    ///
    /// A missing file is an empty history. An unreadable or corrupt file is
    /// logged and treated as empty; it is overwritten on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read(&path) {
            Ok(entries) => entries,
            Err(HistoryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring query history");
                Vec::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    fn read(path: &Path) -> Result<Vec<HistoryEntry>, HistoryError> {
        let content = std::fs::read_to_string(path)?;
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(&content)?;
        entries.truncate(MAX_HISTORY_ENTRIES);
        Ok(entries)
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a successful query and saves the history.
    pub fn record(&mut self, query: &str, execution_time: u64, row_count: usize) {
        let timestamp = Utc::now();
        let mut id = timestamp.timestamp_millis();
        if let Some(newest) = self.entries.first() {
            if let Ok(previous) = newest.id.parse::<i64>() {
                id = id.max(previous + 1);
            }
        }
        self.entries.insert(
            0,
            HistoryEntry {
                id: id.to_string(),
                query: query.to_string(),
                timestamp,
                execution_time: Some(execution_time),
                row_count: Some(row_count),
            },
        );
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        self.persist();
    }

    /// Removes every entry and deletes the file.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove query history")
                }
            }
        }
    }

    /// Writes the history to its file, if it has one.
    pub fn save(&self) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        debug!(path = %path.display(), entries = self.entries.len(), "Saved query history");
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to save query history");
        }
    }
}
