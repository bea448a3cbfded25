//! Word-boundary page splitter for flowing text.
//!
//! Plain text and Word documents have no physical pages, so their extracted
//! text is split into [`Page`]s of roughly `chars_per_page` characters.
//! Boundaries snap forward to the next space or newline so a word is never
//! cut in half while a separator is still ahead.

use crate::models::Page;

/// Page budget for `.txt` and `.rtf` content.
pub const TEXT_CHARS_PER_PAGE: usize = 3000;
/// Page budget for text pulled out of Word documents.
pub const WORD_CHARS_PER_PAGE: usize = 2000;

/// Split `content` into pages numbered from 1.
///
/// Budgets are counted in characters. Always returns at least one page; an
/// empty or all-whitespace input yields a single empty page.
pub fn split_pages(content: &str, chars_per_page: usize) -> Vec<Page> {
    let chars_per_page = chars_per_page.max(1);
    let len = content.len();
    let mut pages = Vec::new();
    let mut pos = 0;

    while pos < len {
        let tentative = advance_chars(content, pos, chars_per_page);
        let (end, next) = if tentative < len {
            // The last character inside the budget may itself be the separator.
            let window = last_char_start(content, tentative);
            match find_separator(content, window) {
                Some(sep) => (sep, sep + 1),
                // Nothing ahead: back off to the last separator in the page,
                // or hard cut without skipping a character.
                None => match rfind_separator(content, pos, window) {
                    Some(sep) => (sep, sep + 1),
                    None => (tentative, tentative),
                },
            }
        } else {
            (len, len)
        };

        let text = content[pos..end].trim();
        if !text.is_empty() {
            pages.push(Page::new(pages.len() as u32 + 1, text));
        }
        pos = next;
    }

    if pages.is_empty() {
        pages.push(Page::empty());
    }
    pages
}

/// Byte index `n` characters after `pos`, clamped to the end of `s`.
fn advance_chars(s: &str, pos: usize, n: usize) -> usize {
    s[pos..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| pos + i)
        .unwrap_or(s.len())
}

fn last_char_start(s: &str, end: usize) -> usize {
    s[..end]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(end)
}

fn find_separator(s: &str, from: usize) -> Option<usize> {
    s[from..]
        .find(|c: char| c == ' ' || c == '\n')
        .map(|i| from + i)
}

fn rfind_separator(s: &str, from: usize, to: usize) -> Option<usize> {
    s[from..to]
        .rfind(|c: char| c == ' ' || c == '\n')
        .map(|i| from + i)
}
