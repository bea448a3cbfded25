//! Core data models used throughout docsearch.
//!
//! These types represent the pages, match spans, and search results that flow
//! through the extraction and search pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// A bounded chunk of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// The single empty page emitted when a document yields no text.
    pub fn empty() -> Self {
        Self::new(1, String::new())
    }
}

/// A match inside a host string.
///
/// `offset` and `length` are byte positions into the string the span is
/// currently attached to (page text, then excerpt text), always on char
/// boundaries. `length` is never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl MatchSpan {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Matching rules for a search run. Serialized in camelCase (history,
/// exports); snake_case keys are accepted when reading config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(default, alias = "case_sensitive")]
    pub case_sensitive: bool,
    #[serde(default, alias = "whole_word")]
    pub whole_word: bool,
    #[serde(default, alias = "use_regex")]
    pub use_regex: bool,
}

/// Excerpt around one or more nearby matches on a page, with spans re-based
/// to `excerpt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextResult {
    pub page_number: u32,
    pub excerpt: String,
    pub matches: Vec<MatchSpan>,
}

/// The unit appended to the result store.
#[derive(Debug, Clone)]
pub struct SearchResultRecord {
    pub file_id: String,
    pub file_name: String,
    pub page_number: u32,
    pub content: String,
    pub matches: Vec<MatchSpan>,
    pub file: Arc<Document>,
}

impl SearchResultRecord {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}
