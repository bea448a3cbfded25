//! Ordered accumulation of the current run's results.
//!
//! The store is a cheap cloneable handle. Readers may take snapshots at any
//! time, including while a run is appending; only the orchestrator mutates it.

use std::sync::{Arc, RwLock};

use crate::models::SearchResultRecord;

#[derive(Clone, Default)]
pub struct ResultStore {
    records: Arc<RwLock<Vec<SearchResultRecord>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, record: SearchResultRecord) {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    pub(crate) fn reset(&self) {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Copy of all records in append order.
    pub fn snapshot(&self) -> Vec<SearchResultRecord> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("len", &self.len())
            .finish()
    }
}
