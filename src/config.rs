use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::context::DEFAULT_CONTEXT_RADIUS;
use crate::models::SearchOptions;
use crate::paginate::{TEXT_CHARS_PER_PAGE, WORD_CHARS_PER_PAGE};

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "./config/dsearch.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Options applied when the command line does not set them.
    #[serde(default)]
    pub defaults: SearchOptions,
    #[serde(default = "default_context_radius")]
    pub context_radius: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            defaults: SearchOptions::default(),
            context_radius: DEFAULT_CONTEXT_RADIUS,
        }
    }
}

fn default_context_radius() -> usize {
    DEFAULT_CONTEXT_RADIUS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_text_chars_per_page")]
    pub text_chars_per_page: usize,
    #[serde(default = "default_word_chars_per_page")]
    pub word_chars_per_page: usize,
    /// Documents larger than this are not decoded.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            text_chars_per_page: TEXT_CHARS_PER_PAGE,
            word_chars_per_page: WORD_CHARS_PER_PAGE,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_text_chars_per_page() -> usize {
    TEXT_CHARS_PER_PAGE
}
fn default_word_chars_per_page() -> usize {
    WORD_CHARS_PER_PAGE
}
fn default_max_file_bytes() -> u64 {
    100 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntakeConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_enabled")]
    pub enabled: bool,
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_history_path(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_history_enabled() -> bool {
    true
}
fn default_history_path() -> PathBuf {
    PathBuf::from("./data/dsearch-history.json")
}
fn default_max_entries() -> usize {
    20
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if given, else [`DEFAULT_CONFIG_PATH`] if present, else defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                load_config(fallback)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.extraction.text_chars_per_page == 0 {
        anyhow::bail!("extraction.text_chars_per_page must be > 0");
    }
    if config.extraction.word_chars_per_page == 0 {
        anyhow::bail!("extraction.word_chars_per_page must be > 0");
    }
    if config.search.context_radius == 0 {
        anyhow::bail!("search.context_radius must be > 0");
    }
    if config.history.max_entries == 0 {
        anyhow::bail!("history.max_entries must be > 0");
    }
    Ok(())
}
