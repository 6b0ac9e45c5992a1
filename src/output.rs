//! Result types produced by the pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A generated document after Markdown → HTML conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    /// The raw text returned by the model.
    pub markdown: String,
    /// HTML fragment for display; diagram blocks are `<div class="mermaid">` containers.
    pub html: String,
    /// Number of diagram containers in `html`.
    pub diagram_count: usize,
}

/// A PDF written by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPdf {
    /// Where the file was written.
    pub path: PathBuf,
    /// Number of A4 pages in the document.
    pub page_count: usize,
    /// File size in bytes.
    pub bytes: usize,
}
