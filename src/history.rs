//! Recent-search history.
//!
//! A small JSON file of past queries, newest first. History is a convenience:
//! a missing or corrupt file loads as empty and save failures are logged,
//! never returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::HistoryConfig;
use crate::models::SearchOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub query: String,
    #[serde(default)]
    pub options: SearchOptions,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub result_count: usize,
}

#[derive(Debug)]
pub struct SearchHistory {
    path: PathBuf,
    max_entries: usize,
    entries: Vec<HistoryEntry>,
}

impl SearchHistory {
    /// Load history from `config.path`. Unreadable files yield an empty
    /// history.
    pub fn load(config: &HistoryConfig) -> Self {
        let entries = match std::fs::read_to_string(&config.path) {
            Ok(content) => match serde_json::from_str::<Vec<HistoryEntry>>(&content) {
                Ok(mut entries) => {
                    entries.truncate(config.max_entries);
                    entries
                }
                Err(e) => {
                    tracing::warn!(
                        path = %config.path.display(),
                        error = %e,
                        "ignoring unreadable search history"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %config.path.display(),
                    error = %e,
                    "failed to read search history"
                );
                Vec::new()
            }
        };
        Self {
            path: config.path.clone(),
            max_entries: config.max_entries,
            entries,
        }
    }

    /// Newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Put a search at the front, replacing an earlier entry with the same
    /// query and options.
    pub fn record(&mut self, query: &str, options: SearchOptions, result_count: usize) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.entries
            .retain(|e| !(e.query == query && e.options == options));
        self.entries.insert(
            0,
            HistoryEntry {
                query: query.to_string(),
                options,
                timestamp: Utc::now(),
                result_count,
            },
        );
        self.entries.truncate(self.max_entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write the history file. Failures are logged.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to save search history"
            );
        }
    }

    fn try_save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
