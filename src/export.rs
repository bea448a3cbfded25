//! Export search results as CSV, JSON, or a printable HTML report.
//!
//! All three formats render the same rows: file name, page number, excerpt,
//! and match count. The HTML report additionally highlights every match in
//! its excerpt.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::models::SearchResultRecord;

/// Maximum excerpt length (in characters) written to a CSV row.
const CSV_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "html" => Some(ExportFormat::Html),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

/// `search-results-2024-05-01T10-22-03.csv`
pub fn default_file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "search-results-{}.{}",
        at.format("%Y-%m-%dT%H-%M-%S"),
        format.extension()
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportReport<'a> {
    search_query: &'a str,
    search_date: String,
    total_results: usize,
    results: Vec<ExportRow<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    file_name: &'a str,
    page_number: u32,
    content: &'a str,
    match_count: usize,
}

impl<'a> From<&'a SearchResultRecord> for ExportRow<'a> {
    fn from(record: &'a SearchResultRecord) -> Self {
        Self {
            file_name: &record.file_name,
            page_number: record.page_number,
            content: &record.content,
            match_count: record.match_count(),
        }
    }
}

/// CSV with a UTF-8 BOM so spreadsheet tools pick up the encoding.
pub fn to_csv(records: &[SearchResultRecord]) -> String {
    let mut out = String::from("\u{feff}");
    out.push_str("\"fileName\",\"pageNumber\",\"content\",\"matchCount\"");
    for record in records {
        let content: String = record
            .content
            .replace(['\r', '\n'], " ")
            .chars()
            .take(CSV_CONTENT_CHARS)
            .collect();
        out.push('\n');
        out.push_str(
            &[
                csv_field(&record.file_name),
                csv_field(&record.page_number.to_string()),
                csv_field(&content),
                csv_field(&record.match_count().to_string()),
            ]
            .join(","),
        );
    }
    out.push('\n');
    out
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn to_json(query: &str, at: DateTime<Utc>, records: &[SearchResultRecord]) -> Result<String> {
    let report = ExportReport {
        search_query: query,
        search_date: at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        total_results: records.len(),
        results: records.iter().map(ExportRow::from).collect(),
    };
    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}

const REPORT_STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; }
.header { border-bottom: 2px solid #333; padding-bottom: 10px; margin-bottom: 20px; }
.result { margin-bottom: 20px; padding: 15px; border: 1px solid #ddd; }
.result-header { font-weight: bold; color: #333; }
.result-content { margin-top: 10px; line-height: 1.6; white-space: pre-wrap; }
.highlight { background-color: yellow; padding: 2px; }";

/// Standalone HTML report, suitable for printing to PDF from a browser.
pub fn to_html(query: &str, at: DateTime<Utc>, records: &[SearchResultRecord]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Search Results Report</title>\n<style>\n");
    out.push_str(REPORT_STYLE);
    out.push_str("\n</style>\n</head>\n<body>\n<div class=\"header\">\n");
    out.push_str("<h1>Search Results Report</h1>\n");
    out.push_str(&format!(
        "<p><strong>Search Query:</strong> {}</p>\n",
        html_escape::encode_text(query)
    ));
    out.push_str(&format!(
        "<p><strong>Date:</strong> {}</p>\n",
        at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "<p><strong>Total Results:</strong> {}</p>\n</div>\n",
        records.len()
    ));
    for record in records {
        out.push_str(&format!(
            "<div class=\"result\">\n<div class=\"result-header\">{} - page {}</div>\n",
            html_escape::encode_text(&record.file_name),
            record.page_number
        ));
        out.push_str(&format!(
            "<div class=\"result-content\">{}</div>\n</div>\n",
            highlight(record)
        ));
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Escape the excerpt and wrap each match in a highlight span.
fn highlight(record: &SearchResultRecord) -> String {
    let content = &record.content;
    let mut out = String::with_capacity(content.len() + record.matches.len() * 32);
    let mut cursor = 0;
    for span in &record.matches {
        // Spans are ascending and non-overlapping; skip any that are not.
        if span.offset < cursor || content.get(span.offset..span.end()).is_none() {
            continue;
        }
        out.push_str(&html_escape::encode_text(&content[cursor..span.offset]));
        out.push_str("<span class=\"highlight\">");
        out.push_str(&html_escape::encode_text(&content[span.offset..span.end()]));
        out.push_str("</span>");
        cursor = span.end();
    }
    out.push_str(&html_escape::encode_text(&content[cursor..]));
    out
}

/// Render `records` in `format` and write them to `output`, or stdout when
/// `output` is `None`. Parent directories of `output` are created.
pub fn write_export(
    format: ExportFormat,
    query: &str,
    records: &[SearchResultRecord],
    output: Option<&Path>,
) -> Result<()> {
    if records.is_empty() && output.is_some() {
        bail!("No search results to export");
    }
    let now = Utc::now();
    let rendered = match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => to_json(query, now, records)?,
        ExportFormat::Html => to_html(query, now, records),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory: {}", parent.display())
                    })?;
                }
            }
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                format = format.extension(),
                results = records.len(),
                "exported results"
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}
