use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn dsearch_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dsearch");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("notes")).unwrap();
    fs::write(
        files_dir.join("alpha.txt"),
        "Alpha document about Rust programming.\n\nIt covers cargo and crates.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.txt"),
        "Beta document about Python. The rustic cabin is unrelated.",
    )
    .unwrap();
    fs::write(
        files_dir.join("notes/gamma.rtf"),
        "{\\rtf1 Gamma notes on deployment in 2023 and 2024.}",
    )
    .unwrap();
    fs::write(files_dir.join("image.png"), "not a document").unwrap();

    let config_content = format!(
        r#"[search]
context_radius = 40

[history]
path = "{}/data/history.json"
max_entries = 5
"#,
        root.display()
    );
    let config_path = config_dir.join("dsearch.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn files_dir(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .display()
        .to_string()
}

fn run_dsearch(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dsearch_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dsearch binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_search_text_output() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, stderr, success) =
        run_dsearch(&config_path, &["search", "rust", &files, "--progress", "off"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    // Case-insensitive substring: "Rust" and "rustic".
    assert!(stdout.contains("1. alpha.txt / page 1 (1 matches)"));
    assert!(stdout.contains("2. beta.txt / page 1 (1 matches)"));
    assert!(stdout.contains("2 results"));
    assert!(!stdout.contains("image.png"));
}

#[test]
fn test_search_whole_word_and_case() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, _, success) =
        run_dsearch(&config_path, &["search", "rust", &files, "--whole-word"]);
    assert!(success);
    assert!(stdout.contains("alpha.txt"));
    assert!(!stdout.contains("beta.txt"));

    let (stdout, _, success) = run_dsearch(
        &config_path,
        &["search", "rust", &files, "--whole-word", "--case-sensitive"],
    );
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_regex() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, stderr, success) =
        run_dsearch(&config_path, &["search", "20[0-9]{2}", &files, "--regex"]);
    assert!(success, "regex search failed: {}", stderr);
    assert!(stdout.contains("gamma.rtf / page 1 (2 matches)"));
    assert!(stdout.contains("matched: 2023, 2024"));
}

#[test]
fn test_search_invalid_regex_falls_back_to_literal() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, stderr, success) =
        run_dsearch(&config_path, &["search", "([a-", &files, "--regex"]);
    assert!(success, "fallback search failed: {}", stderr);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_empty_query() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (_, stderr, success) = run_dsearch(&config_path, &["search", "   ", &files]);
    assert!(!success, "empty query should fail");
    assert!(stderr.contains("search query is empty"));
}

#[test]
fn test_search_no_supported_documents() {
    let (tmp, config_path) = setup_test_env();
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join("photo.jpg"), "x").unwrap();

    let (_, stderr, success) =
        run_dsearch(&config_path, &["search", "rust", empty.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("no documents selected"));
}

#[test]
fn test_search_missing_path() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_dsearch(&config_path, &["search", "rust", "/nonexistent/path"]);
    assert!(!success);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_search_unknown_format() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);
    let (_, stderr, success) =
        run_dsearch(&config_path, &["search", "rust", &files, "--format", "xml"]);
    assert!(!success);
    assert!(stderr.contains("Unknown format"));
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (first, _, _) = run_dsearch(&config_path, &["search", "document", &files]);
    let (second, _, _) = run_dsearch(&config_path, &["search", "document", &files]);
    assert_eq!(first, second);
}

#[test]
fn test_export_json_to_file() {
    let (tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);
    let out = tmp.path().join("exports/results.json");

    let (_, stderr, success) = run_dsearch(
        &config_path,
        &[
            "search",
            "document",
            &files,
            "--format",
            "json",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success, "export failed: {}", stderr);
    assert!(stderr.contains("Exported 2 results"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["searchQuery"], "document");
    assert_eq!(value["totalResults"], 2);
    assert_eq!(value["results"][0]["fileName"], "alpha.txt");
    assert_eq!(value["results"][1]["fileName"], "beta.txt");
    assert!(value["searchDate"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_export_csv_to_stdout() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, _, success) =
        run_dsearch(&config_path, &["search", "cargo", &files, "--format", "csv"]);
    assert!(success);
    assert!(stdout.starts_with('\u{feff}'));
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("\"alpha.txt\",\"1\",\""));
    assert!(lines[1].ends_with(",\"1\""));
}

#[test]
fn test_export_html_report() {
    let (tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);
    let out = tmp.path().join("report.html");

    let (_, _, success) = run_dsearch(
        &config_path,
        &[
            "search",
            "cargo",
            &files,
            "--format",
            "html",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success);
    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<span class=\"highlight\">cargo</span>"));
    assert!(html.contains("alpha.txt - page 1"));
}

#[test]
fn test_text_output_rejects_output_file() {
    let (tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);
    let out = tmp.path().join("results.txt");
    let (_, stderr, success) = run_dsearch(
        &config_path,
        &["search", "cargo", &files, "--output", out.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("--output requires"));
    assert!(!stderr.contains("search started"), "search ran: {}", stderr);
}

#[test]
fn test_export_into_directory_uses_default_name() {
    let (tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);
    let out_dir = tmp.path().join("exports");
    fs::create_dir_all(&out_dir).unwrap();

    let (_, stderr, success) = run_dsearch(
        &config_path,
        &[
            "search",
            "cargo",
            &files,
            "--format",
            "csv",
            "--output",
            out_dir.to_str().unwrap(),
        ],
    );
    assert!(success, "export failed: {}", stderr);

    let names: Vec<String> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 1, "unexpected files: {:?}", names);
    assert!(names[0].starts_with("search-results-"));
    assert!(names[0].ends_with(".csv"));
}

#[test]
fn test_negated_flag_overrides_config_default() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);
    let mut config = fs::read_to_string(&config_path).unwrap();
    config.push_str("\n[search.defaults]\nwhole_word = true\n");
    fs::write(&config_path, config).unwrap();

    let (stdout, _, success) = run_dsearch(&config_path, &["search", "rust", &files]);
    assert!(success);
    assert!(stdout.contains("alpha.txt"));
    assert!(!stdout.contains("beta.txt"), "rustic matched a whole-word search");

    let (stdout, _, success) =
        run_dsearch(&config_path, &["search", "rust", &files, "--no-whole-word"]);
    assert!(success);
    assert!(stdout.contains("beta.txt"));
}

#[test]
fn test_history_records_and_clears() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, _, success) = run_dsearch(&config_path, &["history"]);
    assert!(success);
    assert!(stdout.contains("No search history."));

    run_dsearch(&config_path, &["search", "cargo", &files]);
    run_dsearch(&config_path, &["search", "python", &files, "--whole-word"]);
    run_dsearch(&config_path, &["search", "skipped", &files, "--no-history"]);

    let (stdout, _, success) = run_dsearch(&config_path, &["history"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected history: {}", stdout);
    assert!(lines[1].ends_with("python"));
    assert!(lines[1].contains(" w "));
    assert!(lines[2].ends_with("cargo"));

    let (stdout, _, success) = run_dsearch(&config_path, &["history", "--clear"]);
    assert!(success);
    assert!(stdout.contains("cleared"));
    let (stdout, _, _) = run_dsearch(&config_path, &["history"]);
    assert!(stdout.contains("No search history."));
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[search]\ncontext_radius = 0\n").unwrap();
    let (_, stderr, success) = run_dsearch(&config_path, &["history"]);
    assert!(!success);
    assert!(stderr.contains("context_radius"));
}
