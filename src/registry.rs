//! Registry of intake documents and their selection state.
//!
//! Documents are kept in the order they were added; that order is the order
//! a search visits them in. Each document is keyed by
//! [`document_key`](crate::document::document_key), so adding the same file
//! twice is a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use crate::document::{is_supported_name, Document, DocumentSource};

/// Outcome of [`FileRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
    Unsupported,
}

struct Entry {
    doc: Arc<Document>,
    selected: bool,
}

/// Insertion-ordered set of documents with a selection flag each.
#[derive(Default)]
pub struct FileRegistry {
    entries: Vec<Entry>,
    keys: HashSet<String>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. New documents start selected.
    pub fn add(&mut self, source: Arc<dyn DocumentSource>) -> AddOutcome {
        if !is_supported_name(source.name()) {
            tracing::debug!(file = source.name(), "unsupported file type, skipping");
            return AddOutcome::Unsupported;
        }
        let doc = Document::new(source);
        if !self.keys.insert(doc.key().to_string()) {
            return AddOutcome::Duplicate;
        }
        self.entries.push(Entry {
            doc: Arc::new(doc),
            selected: true,
        });
        AddOutcome::Added
    }

    /// Register many sources, returning how many were new.
    pub fn extend<I>(&mut self, sources: I) -> usize
    where
        I: IntoIterator<Item = Arc<dyn DocumentSource>>,
    {
        sources
            .into_iter()
            .map(|s| self.add(s))
            .filter(|outcome| *outcome == AddOutcome::Added)
            .count()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Document>> {
        self.entries
            .iter()
            .find(|e| e.doc.key() == key)
            .map(|e| e.doc.clone())
    }

    /// Set the selection flag. Returns `false` for an unknown key.
    pub fn set_selected(&mut self, key: &str, selected: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.doc.key() == key) {
            Some(entry) => {
                entry.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Flip the selection flag, returning the new state.
    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.doc.key() == key)?;
        entry.selected = !entry.selected;
        Some(entry.selected)
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.doc.key() == key && e.selected)
    }

    pub fn select_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = true;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
    }

    /// Selected documents in insertion order.
    pub fn selected(&self) -> Vec<Arc<Document>> {
        self.entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.doc.clone())
            .collect()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.entries.iter().map(|e| &e.doc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.selected).count()
    }
}

/// Human-readable size: `"0 Bytes"`, `"512 Bytes"`, `"1.5 KB"`, `"2 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
