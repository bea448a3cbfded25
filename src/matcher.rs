//! Query compilation and match finding.
//!
//! A [`Matcher`] is built once per search run from the user's query and
//! [`SearchOptions`], then applied to every page. Literal queries are escaped,
//! whole-word queries are wrapped in `\b` anchors, and a malformed regular
//! expression degrades to a literal search instead of failing the run.

use regex::{Regex, RegexBuilder};

use crate::error::SearchError;
use crate::models::{MatchSpan, SearchOptions};

/// Compiled matching rule for one search run.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    used_fallback: bool,
}

impl Matcher {
    /// Compile `query` under `options`.
    ///
    /// An invalid user-supplied pattern falls back to the escaped literal with
    /// the same flags. Only a failure of that fallback is returned as an error.
    pub fn new(query: &str, options: &SearchOptions) -> Result<Self, SearchError> {
        let source = if options.use_regex {
            query.to_string()
        } else {
            regex::escape(query)
        };

        match compile(&source, options) {
            Ok(regex) => Ok(Self {
                regex,
                used_fallback: false,
            }),
            Err(err) => {
                tracing::warn!(query, error = %err, "invalid search pattern, matching literally");
                let regex = compile(&regex::escape(query), options)?;
                Ok(Self {
                    regex,
                    used_fallback: true,
                })
            }
        }
    }

    /// Whether the query was compiled as a literal after its pattern failed.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// All non-overlapping, non-empty matches in `text`, left to right.
    pub fn find_matches(&self, text: &str) -> Vec<MatchSpan> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(m) = self.regex.find_at(text, pos) else {
                break;
            };
            if m.is_empty() {
                // Zero-width match: step over one character so the scan ends.
                match text[m.end()..].chars().next() {
                    Some(c) => pos = m.end() + c.len_utf8(),
                    None => break,
                }
                continue;
            }
            spans.push(MatchSpan {
                offset: m.start(),
                length: m.len(),
                text: m.as_str().to_string(),
            });
            pos = m.end();
        }

        spans
    }
}

fn compile(source: &str, options: &SearchOptions) -> Result<Regex, regex::Error> {
    let pattern = if options.whole_word {
        format!(r"\b(?:{})\b", source)
    } else {
        source.to_string()
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
}
