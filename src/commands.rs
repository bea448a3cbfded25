//! Command implementations behind the `dsearch` binary.
//!
//! Each `run_*` function prints to stdout and returns `anyhow::Result`, so
//! `main` only parses arguments and dispatches.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::document::{Document, FileDocument};
use crate::export::{default_file_name, write_export, ExportFormat};
use crate::extract::ContentExtractor;
use crate::history::SearchHistory;
use crate::intake::collect_documents;
use crate::models::{SearchOptions, SearchResultRecord};
use crate::progress::ProgressMode;
use crate::registry::{format_file_size, FileRegistry};
use crate::search::{RunState, SearchOrchestrator, SearchRequest};

/// How `dsearch search` renders its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Export(ExportFormat),
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("text") {
            return Some(OutputFormat::Text);
        }
        ExportFormat::parse(value).map(OutputFormat::Export)
    }
}

#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub query: String,
    pub paths: Vec<PathBuf>,
    pub options: SearchOptions,
    /// Overrides `search.context_radius`.
    pub radius: Option<usize>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub progress: ProgressMode,
    pub record_history: bool,
}

pub async fn run_search(config: &Config, args: SearchArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(radius) = args.radius {
        if radius == 0 {
            bail!("--radius must be > 0");
        }
        config.search.context_radius = radius;
    }
    let output = export_target(args.format, args.output.as_deref(), Utc::now())?;

    let mut registry = FileRegistry::new();
    registry.extend(collect_documents(&args.paths, &config.intake)?);
    tracing::debug!(
        documents = registry.len(),
        selected = registry.selected_count(),
        "documents registered"
    );

    let orchestrator = SearchOrchestrator::from_config(&config);
    let handle = orchestrator
        .start(
            SearchRequest::new(args.query.clone(), args.options),
            registry.selected(),
            args.progress.observer(),
        )
        .await?;

    let token = handle.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    let summary = handle.wait().await;
    ctrl_c.abort();

    let records = orchestrator.results().snapshot();
    match summary.state {
        RunState::Failed => {
            bail!(
                "Search failed: {}",
                summary.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        RunState::Cancelled => {
            eprintln!(
                "Search cancelled after {} of {} documents; showing partial results.",
                summary.documents_searched,
                registry.selected_count()
            );
        }
        _ => {}
    }

    match args.format {
        OutputFormat::Text => print_results(&records),
        OutputFormat::Export(format) => {
            write_export(format, args.query.trim(), &records, output.as_deref())?;
            if let Some(path) = &output {
                eprintln!("Exported {} results to {}", records.len(), path.display());
            }
        }
    }

    if config.history.enabled && args.record_history && summary.state == RunState::Completed {
        let mut history = SearchHistory::load(&config.history);
        history.record(&args.query, args.options, summary.total_results);
        history.save();
    }

    Ok(())
}

/// Where an export is written: `None` for stdout. An existing directory gets
/// a timestamped file name inside it.
fn export_target(
    format: OutputFormat,
    output: Option<&Path>,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    match (format, output) {
        (_, None) => Ok(None),
        (OutputFormat::Text, Some(path)) => bail!(
            "--output requires --format csv, json or html (got text for {})",
            path.display()
        ),
        (OutputFormat::Export(format), Some(path)) if path.is_dir() => {
            Ok(Some(path.join(default_file_name(format, now))))
        }
        (OutputFormat::Export(_), Some(path)) => Ok(Some(path.to_path_buf())),
    }
}

fn print_results(records: &[SearchResultRecord]) {
    if records.is_empty() {
        println!("No results.");
        return;
    }
    for (i, record) in records.iter().enumerate() {
        let matched: Vec<&str> = record.matches.iter().map(|m| m.text.as_str()).collect();
        println!(
            "{}. {} / page {} ({} matches)",
            i + 1,
            record.file_name,
            record.page_number,
            record.match_count()
        );
        println!("    excerpt: \"{}\"", record.content.replace('\n', " "));
        println!("    matched: {}", matched.join(", "));
        println!();
    }
    println!("{} results", records.len());
}

/// Print every page of one document, as the extractor sees it.
pub async fn run_extract(config: &Config, path: &Path) -> Result<()> {
    let source = FileDocument::open(path)
        .with_context(|| format!("Failed to open document: {}", path.display()))?;
    let doc = Document::new(Arc::new(source));
    let extractor = ContentExtractor::new(config.extraction.clone());
    let pages = extractor.extract(&doc).await;

    println!("--- Document ---");
    println!("name:   {}", doc.name());
    println!("key:    {}", doc.key());
    println!("format: {}", doc.format());
    println!("size:   {}", format_file_size(doc.size()));
    println!("pages:  {}", pages.len());
    println!();

    for page in &pages {
        println!("[page {}]", page.page_number);
        println!("{}", page.text);
        println!();
    }
    Ok(())
}

pub fn run_history(config: &Config, clear: bool) -> Result<()> {
    let mut history = SearchHistory::load(&config.history);
    if clear {
        history.clear();
        history.save();
        println!("Search history cleared.");
        return Ok(());
    }

    if history.entries().is_empty() {
        println!("No search history.");
        return Ok(());
    }
    println!("{:<20} {:<8} {:<10} QUERY", "WHEN", "RESULTS", "OPTIONS");
    for entry in history.entries() {
        println!(
            "{:<20} {:<8} {:<10} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.result_count,
            option_flags(&entry.options),
            entry.query
        );
    }
    Ok(())
}

/// Resolve a `--flag` / `--no-flag` pair against the configured default.
pub fn flag_or_default(on: bool, off: bool, default: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => default,
    }
}

/// Compact flag string: `c` case-sensitive, `w` whole word, `r` regex.
fn option_flags(options: &SearchOptions) -> String {
    let flags: String = [
        (options.case_sensitive, 'c'),
        (options.whole_word, 'w'),
        (options.use_regex, 'r'),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, flag)| *flag)
    .collect();
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags
    }
}
