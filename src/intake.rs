//! Path intake: turn command-line paths into document sources.
//!
//! Files are taken as given (if their extension is supported). Directories
//! are walked recursively, filtered through the `[intake]` include/exclude
//! globs plus default excludes for VCS and build directories.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::IntakeConfig;
use crate::document::{is_supported_name, DocumentSource, FileDocument};

/// Collect sources for `paths`, preserving argument order. Within a directory
/// entries are sorted by relative path.
pub fn collect_documents(
    paths: &[PathBuf],
    config: &IntakeConfig,
) -> Result<Vec<Arc<dyn DocumentSource>>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut sources: Vec<Arc<dyn DocumentSource>> = Vec::new();
    for path in paths {
        if !path.exists() {
            bail!("Path does not exist: {}", path.display());
        }
        if path.is_file() {
            if is_supported_file(path) {
                sources.push(Arc::new(FileDocument::open(path)?));
            } else {
                tracing::warn!(path = %path.display(), "unsupported file type, skipping");
            }
            continue;
        }
        sources.extend(scan_directory(
            path,
            config.follow_symlinks,
            &include_set,
            &exclude_set,
        )?);
    }
    Ok(sources)
}

fn scan_directory(
    root: &Path,
    follow_symlinks: bool,
    include_set: &GlobSet,
    exclude_set: &GlobSet,
) -> Result<Vec<Arc<dyn DocumentSource>>> {
    let mut found: Vec<(String, FileDocument)> = Vec::new();

    let walker = WalkDir::new(root).follow_links(follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }
        if !is_supported_file(path) {
            continue;
        }

        found.push((rel_str, FileDocument::open(path)?));
    }

    // Sort for deterministic ordering
    found.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(found
        .into_iter()
        .map(|(_, doc)| Arc::new(doc) as Arc<dyn DocumentSource>)
        .collect())
}

fn is_supported_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| is_supported_name(&n.to_string_lossy()))
        .unwrap_or(false)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
