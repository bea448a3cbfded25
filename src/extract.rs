//! Page-oriented text extraction for PDF, Word, and plain text documents.
//!
//! The extractor owns the recovery policy: it never fails outward. A bad PDF
//! page is skipped, an unreadable Word container falls back to its raw bytes,
//! and a document that cannot be decoded at all becomes a single empty page,
//! which the search pipeline treats as "no matches".

use std::io::Read;

use crate::config::ExtractionConfig;
use crate::document::{Document, DocumentFormat};
use crate::error::ExtractError;
use crate::models::Page;
use crate::paginate::split_pages;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Converts documents into page records.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    config: ExtractionConfig,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl ContentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract `doc` into pages. Always returns at least one page.
    pub async fn extract(&self, doc: &Document) -> Vec<Page> {
        match self.try_extract(doc).await {
            Ok(pages) if !pages.is_empty() => pages,
            Ok(_) => vec![Page::empty()],
            Err(e) => {
                tracing::warn!(file = doc.name(), error = %e, "extraction failed, treating as empty");
                vec![Page::empty()]
            }
        }
    }

    async fn try_extract(&self, doc: &Document) -> Result<Vec<Page>, ExtractError> {
        let limit = self.config.max_file_bytes;
        if doc.size() > limit {
            return Err(ExtractError::TooLarge {
                size: doc.size(),
                limit,
            });
        }

        let bytes = doc.source().read_bytes().await?;
        let format = doc.format();
        let config = self.config.clone();
        let name = doc.name().to_string();

        tokio::task::spawn_blocking(move || decode_pages(&name, format, &bytes, &config))
            .await
            .map_err(|e| ExtractError::Io(std::io::Error::other(e)))?
    }
}

/// Decode raw bytes into pages according to `format`.
pub fn decode_pages(
    name: &str,
    format: DocumentFormat,
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<Vec<Page>, ExtractError> {
    match format {
        DocumentFormat::Pdf => extract_pdf_pages(bytes),
        DocumentFormat::Doc => {
            let text = match extract_docx_text(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(file = name, error = %e, "no Word container, reading raw bytes");
                    String::from_utf8_lossy(bytes).into_owned()
                }
            };
            Ok(split_pages(&text, config.word_chars_per_page))
        }
        // RTF control words stay in the searchable text.
        DocumentFormat::Txt | DocumentFormat::Rtf | DocumentFormat::Unknown => {
            let text = String::from_utf8_lossy(bytes);
            Ok(split_pages(&text, config.text_chars_per_page))
        }
    }
}

/// Per-page PDF text with whitespace collapsed. Pages whose text layer cannot
/// be read are skipped; page numbers follow the PDF.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "lopdf could not load PDF, trying pdf-extract");
            return extract_pdf_pages_fallback(bytes);
        }
    };

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        match doc.extract_text(&[number]) {
            Ok(text) => pages.push(Page::new(number, collapse_whitespace(&text))),
            Err(e) => {
                tracing::warn!(page = number, error = %e, "skipping unreadable PDF page");
            }
        }
    }
    Ok(pages)
}

fn extract_pdf_pages_fallback(bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(texts
        .iter()
        .enumerate()
        .map(|(i, text)| Page::new(i as u32 + 1, collapse_whitespace(text)))
        .collect())
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Ooxml(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    extract_w_t_elements(&doc_xml)
}

/// Concatenate `w:t` runs, one line per `w:p` paragraph.
fn extract_w_t_elements(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use std::sync::Arc;

    fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        use std::io::Write;
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    fn doc(name: &str, bytes: Vec<u8>) -> Document {
        Document::new(Arc::new(MemoryDocument::new(name, bytes, 0)))
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let bytes = docx_with_paragraphs(&["First &amp; one", "Second"]);
        let pages = decode_pages(
            "a.docx",
            DocumentFormat::Doc,
            &bytes,
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "First & one\nSecond");
    }

    #[test]
    fn docx_uses_word_page_budget() {
        let para = "word ".repeat(100);
        let bytes = docx_with_paragraphs(&[para.trim(); 6]);
        let config = ExtractionConfig {
            word_chars_per_page: 1000,
            ..ExtractionConfig::default()
        };
        let pages = decode_pages("a.docx", DocumentFormat::Doc, &bytes, &config).unwrap();
        assert!(pages.len() >= 3, "got {} pages", pages.len());
    }

    #[test]
    fn legacy_doc_falls_back_to_raw_bytes() {
        let pages = decode_pages(
            "old.doc",
            DocumentFormat::Doc,
            b"binary-ish legacy text",
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(pages[0].text, "binary-ish legacy text");
    }

    #[test]
    fn rtf_control_words_are_kept() {
        let pages = decode_pages(
            "a.rtf",
            DocumentFormat::Rtf,
            br"{\rtf1\ansi hello}",
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert!(pages[0].text.contains(r"\rtf1"));
    }

    /// Three-page PDF; page 2's content stream points at a missing object.
    fn pdf_with_broken_middle_page() -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for (i, word) in ["alpha", "broken", "gamma"].iter().enumerate() {
            let contents: Object = if i == 1 {
                Object::Reference((9_999, 0))
            } else {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 24.into()]),
                        Operation::new("Td", vec![100.into(), 600.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*word)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let stream = Stream::new(dictionary! {}, content.encode().unwrap());
                Object::Reference(pdf.add_object(stream))
            };
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => contents,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(Object::Reference(page_id));
        }
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 3,
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        pdf.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn unreadable_pdf_page_does_not_sink_the_document() {
        let pages = extract_pdf_pages(&pdf_with_broken_middle_page()).unwrap();
        let find = |n: u32| pages.iter().find(|p| p.page_number == n);

        assert!(find(1).unwrap().text.contains("alpha"));
        assert!(find(3).unwrap().text.contains("gamma"));
        // Page 2 is either skipped or yields no text; numbering is not shifted.
        assert!(find(2).map_or(true, |p| p.text.is_empty()));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf_pages(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[tokio::test]
    async fn invalid_pdf_becomes_single_empty_page() {
        let pages = ContentExtractor::default()
            .extract(&doc("bad.pdf", b"not a pdf".to_vec()))
            .await;
        assert_eq!(pages, vec![Page::empty()]);
    }

    #[tokio::test]
    async fn oversized_document_is_not_decoded() {
        let extractor = ContentExtractor::new(ExtractionConfig {
            max_file_bytes: 4,
            ..ExtractionConfig::default()
        });
        let pages = extractor.extract(&doc("big.txt", b"needle".to_vec())).await;
        assert_eq!(pages, vec![Page::empty()]);
    }

    #[tokio::test]
    async fn text_is_paginated() {
        let extractor = ContentExtractor::new(ExtractionConfig {
            text_chars_per_page: 5,
            ..ExtractionConfig::default()
        });
        let pages = extractor
            .extract(&doc("a.txt", b"aaaa bbbb cccc".to_vec()))
            .await;
        let texts: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa", "bbbb", "cccc"]);
    }
}
