//! Document handles and the file capability interface.
//!
//! A [`DocumentSource`] is anything that can describe itself (name, size,
//! modification time) and hand over its bytes. The search pipeline only ever
//! sees sources through this trait, so files on disk and in-memory buffers
//! are interchangeable.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use docsearch::document::{Document, DocumentFormat, MemoryDocument};
//!
//! let source = MemoryDocument::new("notes.txt", b"hello world".to_vec(), 0);
//! let doc = Document::new(Arc::new(source));
//! assert_eq!(doc.format(), DocumentFormat::Txt);
//! assert_eq!(doc.key(), "notes.txt_11_0");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ExtractError;

/// Extensions accepted at intake.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf"];

/// File capability interface consumed by the extractor.
#[async_trait]
pub trait DocumentSource: Send + Sync + fmt::Debug {
    /// File name including extension.
    fn name(&self) -> &str;

    /// Size in bytes as reported at intake.
    fn size(&self) -> u64;

    /// Last modification time in milliseconds since the Unix epoch.
    fn last_modified(&self) -> i64;

    /// Read the full contents.
    async fn read_bytes(&self) -> Result<Vec<u8>, ExtractError>;

    /// Read the contents as text, replacing invalid UTF-8 sequences.
    async fn read_text(&self) -> Result<String, ExtractError> {
        let bytes = self.read_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Format inferred from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    /// Word documents, both `.doc` and `.docx`.
    Doc,
    Txt,
    Rtf,
    Unknown,
}

impl DocumentFormat {
    pub fn from_name(name: &str) -> Self {
        match extension_of(name).as_deref() {
            Some("pdf") => DocumentFormat::Pdf,
            Some("doc") | Some("docx") => DocumentFormat::Doc,
            Some("txt") => DocumentFormat::Txt,
            Some("rtf") => DocumentFormat::Rtf,
            _ => DocumentFormat::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Txt => "txt",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Whether `name` carries one of [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_name(name: &str) -> bool {
    extension_of(name)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Stable identity: `"{name}_{size}_{last_modified}"`.
pub fn document_key(name: &str, size: u64, last_modified: i64) -> String {
    format!("{}_{}_{}", name, size, last_modified)
}

/// A registered document. Immutable apart from its selection flag, which the
/// registry owns.
#[derive(Debug)]
pub struct Document {
    key: String,
    format: DocumentFormat,
    source: Arc<dyn DocumentSource>,
}

impl Document {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        let key = document_key(source.name(), source.size(), source.last_modified());
        let format = DocumentFormat::from_name(source.name());
        Self {
            key,
            format,
            source,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn source(&self) -> &dyn DocumentSource {
        self.source.as_ref()
    }
}

/// A file on the local filesystem. Name, size, and modification time are
/// captured when the handle is created.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    name: String,
    size: u64,
    last_modified: i64,
}

impl FileDocument {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        let modified = metadata
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        let last_modified = modified
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            size: metadata.len(),
            last_modified,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for FileDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, ExtractError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// An in-memory document, used by tests and embedders that already hold
/// the bytes.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    name: String,
    bytes: Arc<[u8]>,
    last_modified: i64,
}

impl MemoryDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, last_modified: i64) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            last_modified,
        }
    }

    pub fn text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, text.as_bytes().to_vec(), 0)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, ExtractError> {
        Ok(self.bytes.to_vec())
    }
}
