//! Search events and the observers that consume them.
//!
//! The orchestrator reports everything through a [`SearchObserver`]: progress,
//! each appended result, and how the run ended. Terminal observers write to
//! **stderr** so stdout remains parseable for scripts; [`ChannelObserver`]
//! forwards events to an async consumer such as a UI task.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::SearchResultRecord;

/// A single event emitted during a search run.
#[derive(Clone, Debug)]
pub enum SearchEvent {
    /// `percent` of the documents have been processed; `message` names the
    /// document being searched.
    Progress { percent: f64, message: String },
    ResultAppended(SearchResultRecord),
    SearchCompleted { total: usize },
    SearchCancelled,
    SearchFailed { error: String },
}

/// Receives search events. Called from the run task.
pub trait SearchObserver: Send + Sync {
    fn report(&self, event: SearchEvent);
}

/// Human-friendly progress on stderr: "search  42%  report.pdf (3/7)".
pub struct StderrProgress;

impl SearchObserver for StderrProgress {
    fn report(&self, event: SearchEvent) {
        let line = match &event {
            SearchEvent::Progress { percent, message } => {
                format!("search {:>4.0}%  {}\n", percent, message)
            }
            SearchEvent::ResultAppended(_) => return,
            SearchEvent::SearchCompleted { total } => {
                format!("search done  {} results\n", format_number(*total as u64))
            }
            SearchEvent::SearchCancelled => "search cancelled\n".to_string(),
            SearchEvent::SearchFailed { error } => format!("search failed: {}\n", error),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable events: one JSON object per line on stderr.
pub struct JsonProgress;

impl SearchObserver for JsonProgress {
    fn report(&self, event: SearchEvent) {
        let obj = match &event {
            SearchEvent::Progress { percent, message } => serde_json::json!({
                "event": "progress",
                "percent": percent,
                "message": message
            }),
            SearchEvent::ResultAppended(record) => serde_json::json!({
                "event": "result",
                "fileName": record.file_name,
                "pageNumber": record.page_number,
                "matchCount": record.match_count()
            }),
            SearchEvent::SearchCompleted { total } => serde_json::json!({
                "event": "completed",
                "total": total
            }),
            SearchEvent::SearchCancelled => serde_json::json!({ "event": "cancelled" }),
            SearchEvent::SearchFailed { error } => serde_json::json!({
                "event": "failed",
                "error": error
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op observer when progress is disabled.
pub struct NoProgress;

impl SearchObserver for NoProgress {
    fn report(&self, _event: SearchEvent) {}
}

/// Forwards events into an unbounded channel. Events sent after the receiver
/// is dropped are discarded.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SearchEvent>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SearchObserver for ChannelObserver {
    fn report(&self, event: SearchEvent) {
        let _ = self.tx.send(event);
    }
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a CLI value; `auto` picks [`default_for_tty`](Self::default_for_tty).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::default_for_tty()),
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    pub fn observer(&self) -> Arc<dyn SearchObserver> {
        match self {
            ProgressMode::Off => Arc::new(NoProgress),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_modes() {
        assert_eq!(ProgressMode::parse("off"), Some(ProgressMode::Off));
        assert_eq!(ProgressMode::parse("json"), Some(ProgressMode::Json));
        assert_eq!(ProgressMode::parse("loud"), None);
    }

    #[tokio::test]
    async fn channel_observer_forwards_events() {
        let (observer, mut rx) = ChannelObserver::channel();
        observer.report(SearchEvent::SearchCompleted { total: 3 });
        match rx.recv().await {
            Some(SearchEvent::SearchCompleted { total }) => assert_eq!(total, 3),
            other => panic!("unexpected event: {:?}", other),
        }
        drop(rx);
        observer.report(SearchEvent::SearchCancelled);
    }
}
