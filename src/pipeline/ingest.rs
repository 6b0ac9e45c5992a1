//! Context ingestion: turn an uploaded file into context text.
//!
//! Plain text and Markdown are taken verbatim. PDFs go through the
//! [`TextExtractor`] capability: text items of a page are joined with a single
//! space and pages are concatenated in order. Ingestion never fails outward:
//! every read or parse failure becomes one of the fixed context-field messages,
//! so the session always ends up with either context or a designated error string.

use crate::capabilities::{Capabilities, TextExtractor};
use crate::config::Locale;
use crate::error::DocGenError;
use crate::messages::Messages;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Declared kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Markdown,
    Pdf,
    Unsupported,
}

impl FileKind {
    /// Classify an upload.
    ///
    /// A declared MIME type decides on its own, except that a `.md` name is
    /// always Markdown. Without a declared type the extension (case-insensitive)
    /// decides.
    pub fn detect(file_name: &str, declared_mime: Option<&str>) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if ext.as_deref() == Some("md") {
            return FileKind::Markdown;
        }
        match declared_mime.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            Some("application/pdf") => FileKind::Pdf,
            Some("text/plain") => FileKind::Text,
            Some("text/markdown") => FileKind::Markdown,
            Some(_) => FileKind::Unsupported,
            None => match ext.as_deref() {
                Some("pdf") => FileKind::Pdf,
                Some("txt") => FileKind::Text,
                _ => FileKind::Unsupported,
            },
        }
    }

    /// A PDF with no extractor available is handled like any unsupported type.
    pub fn effective(self, pdf_text_available: bool) -> Self {
        match self {
            FileKind::Pdf if !pdf_text_available => FileKind::Unsupported,
            other => other,
        }
    }
}

/// Where the bytes of an uploaded file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A user-selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub mime: Option<String>,
    pub source: FileSource,
}

impl FileHandle {
    /// Handle for a file on disk; the name is the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            mime: None,
            source: FileSource::Path(path),
        }
    }

    /// Handle for an in-memory upload.
    pub fn from_bytes(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            source: FileSource::Bytes(bytes),
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::detect(&self.name, self.mime.as_deref())
    }

    async fn read(&self) -> Result<Vec<u8>, DocGenError> {
        match &self.source {
            FileSource::Bytes(b) => Ok(b.clone()),
            FileSource::Path(p) => tokio::fs::read(p).await.map_err(|e| DocGenError::FileRead {
                path: p.clone(),
                source: e,
            }),
        }
    }
}

/// Result of ingesting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// Kept file name; `None` when the file was rejected.
    pub file_name: Option<String>,
    /// Extracted context or one of the context-field error strings.
    pub context: String,
}

/// Detect, read and extract in one call.
pub async fn ingest(handle: &FileHandle, capabilities: &Capabilities, locale: Locale) -> Ingested {
    let messages = Messages::for_locale(locale);
    let kind = handle
        .kind()
        .effective(capabilities.text_extractor.is_some());
    if kind == FileKind::Unsupported {
        info!("Rejected unsupported file '{}'", handle.name);
        return Ingested {
            file_name: None,
            context: messages.unsupported_file.to_string(),
        };
    }
    let context = load_context(
        handle,
        kind,
        capabilities.text_extractor.as_deref(),
        messages,
    )
    .await;
    Ingested {
        file_name: Some(handle.name.clone()),
        context,
    }
}

/// Read a file of an already-accepted kind into context text.
pub async fn load_context(
    handle: &FileHandle,
    kind: FileKind,
    extractor: Option<&dyn TextExtractor>,
    messages: &Messages,
) -> String {
    let bytes = match handle.read().await {
        Ok(b) => b,
        Err(e) => {
            error!("Error reading '{}': {}", handle.name, e);
            return match kind {
                FileKind::Pdf => messages.pdf_read_failed,
                _ => messages.file_read_failed,
            }
            .to_string();
        }
    };

    match kind {
        FileKind::Text | FileKind::Markdown => {
            debug!("Read {} bytes of text from '{}'", bytes.len(), handle.name);
            String::from_utf8_lossy(&bytes).into_owned()
        }
        FileKind::Pdf => {
            let Some(extractor) = extractor else {
                return messages.unsupported_file.to_string();
            };
            match extractor.extract_pages(&bytes).await {
                Ok(pages) => {
                    info!("Extracted {} pages of text from '{}'", pages.len(), handle.name);
                    join_pdf_pages(&pages)
                }
                Err(e) => {
                    error!("Error reading PDF '{}': {}", handle.name, e);
                    messages.pdf_read_failed.to_string()
                }
            }
        }
        FileKind::Unsupported => messages.unsupported_file.to_string(),
    }
}

/// Join the items of each page with a single space and concatenate pages in order.
pub fn join_pdf_pages(pages: &[Vec<String>]) -> String {
    pages.iter().map(|items| items.join(" ")).collect()
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// [`TextExtractor`] backed by pdfium.
///
/// Binds `lib_path`, else `PDFIUM_LIB_PATH`, else the system library. Extraction
/// runs in `spawn_blocking` since pdfium calls are blocking.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    lib_path: Option<String>,
}

impl PdfiumTextExtractor {
    pub fn new(lib_path: Option<String>) -> Self {
        Self { lib_path }
    }

    /// Bind once to check the library is usable.
    pub fn probe(lib_path: Option<String>) -> Result<Self, DocGenError> {
        bind_pdfium(lib_path.as_deref())?;
        Ok(Self::new(lib_path))
    }
}

#[async_trait]
impl TextExtractor for PdfiumTextExtractor {
    async fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<String>>, DocGenError> {
        let bytes = pdf.to_vec();
        let lib_path = self.lib_path.clone();
        tokio::task::spawn_blocking(move || extract_pages_blocking(lib_path.as_deref(), &bytes))
            .await
            .map_err(|e| DocGenError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

fn bind_pdfium(lib_path: Option<&str>) -> Result<Pdfium, DocGenError> {
    let explicit = lib_path.map(str::to_string).or_else(|| {
        std::env::var("PDFIUM_LIB_PATH")
            .ok()
            .filter(|p| !p.is_empty())
    });
    let bindings = match explicit {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DocGenError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn extract_pages_blocking(
    lib_path: Option<&str>,
    bytes: &[u8],
) -> Result<Vec<Vec<String>>, DocGenError> {
    let pdfium = bind_pdfium(lib_path)?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| DocGenError::PdfExtraction(format!("{:?}", e)))?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| DocGenError::PdfExtraction(format!("page {}: {:?}", idx + 1, e)))?;
        let items: Vec<String> = text.segments().iter().map(|s| s.text()).collect();
        debug!("Page {}: {} text items", idx + 1, items.len());
        pages.push(items);
    }
    Ok(pages)
}
