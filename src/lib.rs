//! # docsearch
//!
//! Local full-text search across PDF, Word and plain-text documents.
//!
//! Documents are extracted into numbered pages, every page is scanned with a
//! literal or regex matcher, and nearby matches are grouped into short
//! excerpts. Results stream out as they are found and can be exported as
//! CSV, JSON or a printable HTML report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐
//! │  Intake  │──▶│ Extractor │──▶│ Matcher │──▶│ Context │──▶│  Store  │
//! │ fs/walk  │   │ pdf/docx/ │   │  regex  │   │ builder │   │ records │
//! └──────────┘   │   text    │   └─────────┘   └─────────┘   └────┬────┘
//!                └───────────┘                                   │
//!                      ▲          orchestrator (one run)         ▼
//!                      └──────────────────────────────── events / export
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dsearch search "contract" ./docs              # text output
//! dsearch search "c.t" ./docs --regex --format json --output out/results.json
//! dsearch extract ./docs/report.pdf             # show extracted pages
//! dsearch history
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`document`] | Document sources, formats and identity |
//! | [`registry`] | Intake registry with selection state |
//! | [`intake`] | Filesystem path collection |
//! | [`extract`] | Text extraction into pages |
//! | [`paginate`] | Page splitting on word boundaries |
//! | [`matcher`] | Literal / regex match engine |
//! | [`context`] | Excerpt grouping around matches |
//! | [`search`] | Search orchestration and cancellation |
//! | [`store`] | Ordered result store |
//! | [`progress`] | Search events and observers |
//! | [`export`] | CSV, JSON and HTML export |
//! | [`history`] | Recent-search history |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod export;
pub mod extract;
pub mod history;
pub mod intake;
pub mod matcher;
pub mod models;
pub mod paginate;
pub mod progress;
pub mod registry;
pub mod search;
pub mod store;
