//! Search orchestration.
//!
//! A run walks the selected documents in order, one at a time:
//! extract → match each page → build context windows → append records.
//! Progress and every appended record are reported as they happen, so a
//! consumer can render partial results while the run is still going.
//!
//! Cancellation is cooperative. [`SearchHandle::cancel`] sets a
//! level-triggered token that the run checks before each document, after
//! each extraction and before each page; results already appended stay in
//! the store.
//!
//! ```text
//!             start()            all documents
//!   Idle ──────────────▶ Running ───────────────▶ Completed
//!                           │  cancel()
//!                           ├───────────────────▶ Cancelled
//!                           │  internal fault
//!                           └───────────────────▶ Failed
//! ```

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::{contexts_for_page, DEFAULT_CONTEXT_RADIUS};
use crate::document::Document;
use crate::error::{SearchError, ValidationError};
use crate::extract::ContentExtractor;
use crate::matcher::Matcher;
use crate::models::{Page, SearchOptions, SearchResultRecord};
use crate::progress::{SearchEvent, SearchObserver};
use crate::store::ResultStore;

/// Query and matching rules for one run.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            query: query.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub state: RunState,
    pub total_results: usize,
    /// Documents fully processed before the run ended.
    pub documents_searched: usize,
    pub error: Option<String>,
}

struct ActiveRun {
    cancel: CancellationToken,
    state: watch::Receiver<RunState>,
}

/// Runs searches over documents, one run at a time.
pub struct SearchOrchestrator {
    extractor: ContentExtractor,
    context_radius: usize,
    store: ResultStore,
    run_lock: Arc<tokio::sync::Mutex<()>>,
    active: Mutex<Option<ActiveRun>>,
}

impl Default for SearchOrchestrator {
    fn default() -> Self {
        Self::new(ContentExtractor::default(), DEFAULT_CONTEXT_RADIUS)
    }
}

impl SearchOrchestrator {
    pub fn new(extractor: ContentExtractor, context_radius: usize) -> Self {
        Self {
            extractor,
            context_radius,
            store: ResultStore::new(),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            active: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ContentExtractor::new(config.extraction.clone()),
            config.search.context_radius,
        )
    }

    /// Read handle on the current run's results.
    pub fn results(&self) -> ResultStore {
        self.store.clone()
    }

    /// State of the most recent run, or `Idle` if none has started.
    pub fn state(&self) -> RunState {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|run| *run.state.borrow())
            .unwrap_or(RunState::Idle)
    }

    /// Start a run over `documents` in the given order.
    ///
    /// Fails with a validation error, without touching the store, if the
    /// query is blank or no documents are given. A run still in flight is
    /// cancelled and awaited before the new one resets the store.
    pub async fn start(
        &self,
        request: SearchRequest,
        documents: Vec<Arc<Document>>,
        observer: Arc<dyn SearchObserver>,
    ) -> Result<SearchHandle, SearchError> {
        let query = request.query.trim().to_string();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        if documents.is_empty() {
            return Err(ValidationError::NoDocuments.into());
        }

        if let Some(previous) = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            previous.cancel.cancel();
        }
        let guard = self.run_lock.clone().lock_owned().await;

        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(RunState::Running);
        *self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(ActiveRun {
            cancel: cancel.clone(),
            state: state_rx.clone(),
        });
        self.store.reset();

        tracing::info!(
            query = %query,
            documents = documents.len(),
            case_sensitive = request.options.case_sensitive,
            whole_word = request.options.whole_word,
            use_regex = request.options.use_regex,
            "search started"
        );

        let run = Run {
            query,
            options: request.options,
            documents,
            extractor: self.extractor.clone(),
            context_radius: self.context_radius,
            store: self.store.clone(),
            observer: observer.clone(),
            cancel: cancel.clone(),
            state_tx,
        };
        let task = tokio::spawn(async move {
            let _guard = guard;
            run.execute().await
        });

        Ok(SearchHandle {
            cancel,
            state: state_rx,
            observer,
            task,
        })
    }
}

/// Handle on a started run.
pub struct SearchHandle {
    cancel: CancellationToken,
    state: watch::Receiver<RunState>,
    observer: Arc<dyn SearchObserver>,
    task: JoinHandle<RunSummary>,
}

impl SearchHandle {
    /// Request cancellation. Takes effect at the run's next check point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run, for callers that hand cancellation to
    /// another task (e.g. a Ctrl-C listener).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Wait for the run to end.
    pub async fn wait(self) -> RunSummary {
        match self.task.await {
            Ok(summary) => summary,
            Err(e) => {
                let error = SearchError::Orchestration(e.to_string()).to_string();
                tracing::error!(error = %error, "search run failed");
                self.observer.report(SearchEvent::SearchFailed {
                    error: error.clone(),
                });
                RunSummary {
                    state: RunState::Failed,
                    total_results: 0,
                    documents_searched: 0,
                    error: Some(error),
                }
            }
        }
    }
}

/// Working set of one run, owned by its task.
struct Run {
    query: String,
    options: SearchOptions,
    documents: Vec<Arc<Document>>,
    extractor: ContentExtractor,
    context_radius: usize,
    store: ResultStore,
    observer: Arc<dyn SearchObserver>,
    cancel: CancellationToken,
    state_tx: watch::Sender<RunState>,
}

impl Run {
    async fn execute(self) -> RunSummary {
        let matcher = match Matcher::new(&self.query, &self.options) {
            Ok(matcher) => matcher,
            Err(e) => return self.fail(e.to_string(), 0, 0),
        };
        tracing::debug!(literal_fallback = matcher.used_fallback(), "matcher compiled");

        let total = self.documents.len();
        let mut results = 0;
        let mut searched = 0;

        for (index, doc) in self.documents.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return self.finish(RunState::Cancelled, results, searched);
            }
            self.observer.report(SearchEvent::Progress {
                percent: percent(index, total),
                message: format!("{} ({}/{})", doc.name(), index + 1, total),
            });

            let pages = self.extractor.extract(doc).await;
            if self.cancel.is_cancelled() {
                return self.finish(RunState::Cancelled, results, searched);
            }

            let before = results;
            if !self.search_pages(doc, &pages, &matcher, &mut results) {
                return self.finish(RunState::Cancelled, results, searched);
            }
            tracing::debug!(
                file = doc.name(),
                pages = pages.len(),
                results = results - before,
                "document searched"
            );
            searched += 1;

            tokio::task::yield_now().await;
        }

        self.observer.report(SearchEvent::Progress {
            percent: 100.0,
            message: format!("searched {} documents", total),
        });
        self.finish(RunState::Completed, results, searched)
    }

    /// Append every context on `pages`, counting them into `results`.
    /// Returns `false` if cancellation stopped the scan part way.
    fn search_pages(
        &self,
        doc: &Arc<Document>,
        pages: &[Page],
        matcher: &Matcher,
        results: &mut usize,
    ) -> bool {
        for page in pages {
            if self.cancel.is_cancelled() {
                return false;
            }
            let matches = matcher.find_matches(&page.text);
            if matches.is_empty() {
                continue;
            }
            for context in contexts_for_page(page, &matches, self.context_radius) {
                let record = SearchResultRecord {
                    file_id: doc.key().to_string(),
                    file_name: doc.name().to_string(),
                    page_number: context.page_number,
                    content: context.excerpt,
                    matches: context.matches,
                    file: doc.clone(),
                };
                self.store.append(record.clone());
                self.observer.report(SearchEvent::ResultAppended(record));
                *results += 1;
            }
        }
        true
    }

    fn finish(&self, state: RunState, total_results: usize, documents_searched: usize) -> RunSummary {
        match state {
            RunState::Cancelled => {
                tracing::info!(results = total_results, documents_searched, "search cancelled");
                self.observer.report(SearchEvent::SearchCancelled);
            }
            _ => {
                tracing::info!(results = total_results, documents_searched, "search completed");
                self.observer.report(SearchEvent::SearchCompleted {
                    total: total_results,
                });
            }
        }
        let _ = self.state_tx.send(state);
        RunSummary {
            state,
            total_results,
            documents_searched,
            error: None,
        }
    }

    fn fail(&self, error: String, total_results: usize, documents_searched: usize) -> RunSummary {
        tracing::error!(error = %error, "search run failed");
        self.observer.report(SearchEvent::SearchFailed {
            error: error.clone(),
        });
        let _ = self.state_tx.send(RunState::Failed);
        RunSummary {
            state: RunState::Failed,
            total_results,
            documents_searched,
            error: Some(error),
        }
    }
}

impl Drop for Run {
    // A run that unwinds before reaching a terminal state is marked failed so
    // state readers do not see `Running` forever.
    fn drop(&mut self) {
        if *self.state_tx.borrow() == RunState::Running {
            self.state_tx.send_replace(RunState::Failed);
        }
    }
}

fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}
