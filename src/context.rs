//! Context windows around matches.
//!
//! Matches that sit close together on a page are merged into one excerpt so a
//! reader sees them in a single window; distant matches get windows of their
//! own. Excerpt whitespace is normalized and every span is re-based into the
//! excerpt through the same normalization, so spans keep addressing exactly
//! the text they matched.

use crate::models::{ContextResult, MatchSpan, Page};

/// Characters of context kept on each side of a group of matches.
pub const DEFAULT_CONTEXT_RADIUS: usize = 150;

/// An excerpt with its matches re-based to excerpt offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFragment {
    pub excerpt: String,
    pub matches: Vec<MatchSpan>,
}

impl ContextFragment {
    pub fn into_result(self, page_number: u32) -> ContextResult {
        ContextResult {
            page_number,
            excerpt: self.excerpt,
            matches: self.matches,
        }
    }
}

/// Group `matches` (spans into `text`) into context fragments.
///
/// A new group starts when more than `2 * radius` characters separate the
/// previous match's end from the next match's start. Every input match ends
/// up in exactly one fragment.
pub fn build_contexts(text: &str, matches: &[MatchSpan], radius: usize) -> Vec<ContextFragment> {
    let mut sorted = matches.to_vec();
    sorted.sort_by_key(|m| m.offset);

    let mut groups: Vec<Vec<MatchSpan>> = Vec::new();
    let mut current: Vec<MatchSpan> = Vec::new();
    let mut current_end = 0;

    for m in sorted {
        if !current.is_empty() && char_gap(text, current_end, m.offset) > 2 * radius {
            groups.push(std::mem::take(&mut current));
        }
        current_end = if current.is_empty() {
            m.end()
        } else {
            current_end.max(m.end())
        };
        current.push(m);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .map(|group| excerpt_for_group(text, group, radius))
        .collect()
}

/// [`build_contexts`] over a page, tagging each fragment with its page number.
pub fn contexts_for_page(page: &Page, matches: &[MatchSpan], radius: usize) -> Vec<ContextResult> {
    build_contexts(&page.text, matches, radius)
        .into_iter()
        .map(|fragment| fragment.into_result(page.page_number))
        .collect()
}

fn excerpt_for_group(text: &str, group: Vec<MatchSpan>, radius: usize) -> ContextFragment {
    let first = group.first().map(|m| m.offset).unwrap_or(0);
    let last_end = group.iter().map(MatchSpan::end).max().unwrap_or(first);

    let start = retreat_chars(text, first, radius);
    let end = advance_chars(text, last_end, radius);
    let boundaries: Vec<usize> = group
        .iter()
        .flat_map(|m| [m.offset - start, m.end() - start])
        .collect();
    let norm = Normalized::new(&text[start..end], first - start, last_end - start, &boundaries);

    let matches = group
        .into_iter()
        .map(|m| {
            let offset = norm.start_map[m.offset - start];
            let end = norm.end_map[m.end() - start];
            MatchSpan {
                offset,
                length: end - offset,
                text: norm.text[offset..end].to_string(),
            }
        })
        .collect();

    ContextFragment {
        excerpt: norm.text,
        matches,
    }
}

/// Whitespace-normalized excerpt plus byte maps from the raw slice into it.
///
/// `start_map[i]` is where a span starting at raw byte `i` begins in `text`;
/// `end_map[i]` is where a span ending at raw byte `i` ends. They differ only
/// inside a collapsed whitespace run, so a span covering part of a run keeps
/// the run's replacement character. A run with a match boundary strictly
/// inside it is kept verbatim, so adjacent spans meeting in the run cannot
/// overlap after re-basing.
struct Normalized {
    text: String,
    start_map: Vec<usize>,
    end_map: Vec<usize>,
}

impl Normalized {
    /// Leading/trailing whitespace is trimmed, but never inside
    /// `[keep_from, keep_to)`.
    fn new(raw: &str, keep_from: usize, keep_to: usize, boundaries: &[usize]) -> Self {
        let lead = (raw.len() - raw.trim_start().len()).min(keep_from);
        let tail = raw.trim_end().len().max(keep_to);

        let mut norm = Self {
            text: String::with_capacity(tail.saturating_sub(lead)),
            start_map: vec![0; raw.len() + 1],
            end_map: vec![0; raw.len() + 1],
        };

        let mut run: Option<(usize, usize)> = None;
        for (i, c) in raw[lead..tail].char_indices() {
            let i = lead + i;
            if c.is_whitespace() {
                let (run_start, newlines) = run.unwrap_or((i, 0));
                run = Some((run_start, newlines + usize::from(c == '\n')));
                continue;
            }
            if let Some((run_start, newlines)) = run.take() {
                norm.push_run(raw, run_start, i, newlines, boundaries);
            }
            let o = norm.text.len();
            for b in i..i + c.len_utf8() {
                norm.start_map[b] = o;
                norm.end_map[b] = o;
            }
            norm.text.push(c);
        }
        if let Some((run_start, newlines)) = run.take() {
            norm.push_run(raw, run_start, tail, newlines, boundaries);
        }

        let out_len = norm.text.len();
        for b in tail..=raw.len() {
            norm.start_map[b] = out_len;
            norm.end_map[b] = out_len;
        }
        norm
    }

    /// Collapse raw bytes `[run_start, run_end)`: a blank line becomes one
    /// newline, anything else one space.
    fn push_run(
        &mut self,
        raw: &str,
        run_start: usize,
        run_end: usize,
        newlines: usize,
        boundaries: &[usize],
    ) {
        let o = self.text.len();
        if boundaries.iter().any(|&b| b > run_start && b < run_end) {
            for b in run_start..run_end {
                self.start_map[b] = o + (b - run_start);
                self.end_map[b] = o + (b - run_start);
            }
            self.text.push_str(&raw[run_start..run_end]);
            return;
        }
        self.text.push(if newlines >= 2 { '\n' } else { ' ' });
        self.start_map[run_start] = o;
        self.end_map[run_start] = o;
        for b in run_start + 1..run_end {
            self.start_map[b] = o;
            self.end_map[b] = o + 1;
        }
    }
}

fn char_gap(text: &str, from: usize, to: usize) -> usize {
    if to <= from {
        0
    } else {
        text[from..to].chars().count()
    }
}

fn retreat_chars(text: &str, pos: usize, n: usize) -> usize {
    if n == 0 {
        return pos;
    }
    text[..pos]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn advance_chars(text: &str, pos: usize, n: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}
