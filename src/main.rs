//! # docsearch CLI (`dsearch`)
//!
//! Searches local documents and prints or exports the matching excerpts.
//!
//! ## Usage
//!
//! ```bash
//! dsearch --config ./config/dsearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dsearch search <query> <paths>...` | Search files and directories |
//! | `dsearch extract <file>` | Print the extracted pages of one document |
//! | `dsearch history` | List recent searches (`--clear` to empty) |
//!
//! ## Examples
//!
//! ```bash
//! # Case-insensitive literal search over a directory
//! dsearch search "invoice" ./docs
//!
//! # Whole-word, case-sensitive search with JSON progress on stderr
//! dsearch search "API" ./docs --whole-word --case-sensitive --progress json
//!
//! # Regex search exported as a printable report
//! dsearch search "20[0-9]{2}" ./docs --regex --format html --output report.html
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `docsearch=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docsearch::commands::{self, flag_or_default, OutputFormat, SearchArgs};
use docsearch::config;
use docsearch::models::SearchOptions;
use docsearch::progress::ProgressMode;

/// docsearch: full-text search over local PDF, Word and text documents.
#[derive(Parser)]
#[command(
    name = "dsearch",
    about = "docsearch: full-text search over local PDF, Word and text documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dsearch.toml` when that file exists, otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search documents for a query.
    ///
    /// Files are searched in the order given; directories are walked
    /// recursively and their supported files searched in sorted order.
    /// Press Ctrl-C to stop early and keep the results found so far.
    Search {
        /// The search query (a literal unless `--regex` is given).
        query: String,

        /// Files or directories to search.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Match case exactly.
        #[arg(long, overrides_with = "no_case_sensitive")]
        case_sensitive: bool,

        /// Ignore case even if the config enables case-sensitive matching.
        #[arg(long, overrides_with = "case_sensitive")]
        no_case_sensitive: bool,

        /// Only match whole words.
        #[arg(long, overrides_with = "no_whole_word")]
        whole_word: bool,

        /// Match inside words even if the config enables whole-word matching.
        #[arg(long, overrides_with = "whole_word")]
        no_whole_word: bool,

        /// Treat the query as a regular expression.
        #[arg(long, overrides_with = "no_regex")]
        regex: bool,

        /// Treat the query literally even if the config enables regex.
        #[arg(long, overrides_with = "regex")]
        no_regex: bool,

        /// Characters of context on each side of a match.
        #[arg(long)]
        radius: Option<usize>,

        /// Output format: `text`, `json`, `csv`, or `html`.
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the export to this file instead of stdout. An existing
        /// directory gets a timestamped `search-results-*` file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Progress on stderr: `auto`, `off`, `human`, or `json`.
        #[arg(long, default_value = "auto")]
        progress: String,

        /// Do not record this search in the history file.
        #[arg(long)]
        no_history: bool,
    },

    /// Print the pages extracted from a single document.
    Extract {
        /// Path to a PDF, Word or text document.
        file: PathBuf,
    },

    /// List recent searches.
    History {
        /// Remove all history entries.
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsearch=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();
    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            query,
            paths,
            case_sensitive,
            no_case_sensitive,
            whole_word,
            no_whole_word,
            regex,
            no_regex,
            radius,
            format,
            output,
            progress,
            no_history,
        } => {
            let format = OutputFormat::parse(&format).ok_or_else(|| {
                anyhow::anyhow!("Unknown format '{}'. Use text, json, csv, or html.", format)
            })?;
            let progress = ProgressMode::parse(&progress).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown progress mode '{}'. Use auto, off, human, or json.",
                    progress
                )
            })?;
            let defaults = cfg.search.defaults;
            let options = SearchOptions {
                case_sensitive: flag_or_default(
                    case_sensitive,
                    no_case_sensitive,
                    defaults.case_sensitive,
                ),
                whole_word: flag_or_default(whole_word, no_whole_word, defaults.whole_word),
                use_regex: flag_or_default(regex, no_regex, defaults.use_regex),
            };
            commands::run_search(
                &cfg,
                SearchArgs {
                    query,
                    paths,
                    options,
                    radius,
                    format,
                    output,
                    progress,
                    record_history: !no_history,
                },
            )
            .await?;
        }
        Commands::Extract { file } => {
            commands::run_extract(&cfg, &file).await?;
        }
        Commands::History { clear } => {
            commands::run_history(&cfg, clear)?;
        }
    }

    Ok(())
}
