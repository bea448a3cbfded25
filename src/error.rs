//! Error taxonomy for the search pipeline.
//!
//! Only [`SearchError`] ever reaches a caller of the orchestrator. Extraction
//! errors are recovered inside the extractor and pattern errors inside the
//! matcher; both are logged and never propagated.

use thiserror::Error;

/// Rejected search request. The run never starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("no documents selected")]
    NoDocuments,
}

/// Extraction failure for one document or one page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The query could not be compiled even as an escaped literal.
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("search run failed: {0}")]
    Orchestration(String),
}
