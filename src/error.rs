//! Error types for the domain-docgen library.
//!
//! Library functions return [`DocGenError`]. The session state machine never
//! surfaces these raw: each failure is logged and mapped to one of the fixed
//! user-visible strings in [`crate::messages::Messages`], so a failure always
//! resolves back to an idle session with a readable notice.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the domain-docgen library.
#[derive(Debug, Error)]
pub enum DocGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded file is not `.txt`, `.md` or `.pdf`.
    #[error("Unsupported file type: '{name}' (expected .txt, .md or .pdf)")]
    UnsupportedFileType { name: String },

    /// The context file could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF context errors ────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// The PDF could not be parsed or its text could not be read.
    #[error("PDF text extraction failed: {0}")]
    PdfExtraction(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// The endpoint answered with a non-success HTTP status.
    #[error("Generation API call failed with status {status}")]
    GenerationStatus { status: u16 },

    /// The request never produced a response (DNS, TLS, connection reset, timeout…).
    #[error("Generation request failed: {0}")]
    GenerationTransport(String),

    /// The endpoint answered 2xx but the body was not JSON.
    #[error("Generation response could not be decoded: {0}")]
    GenerationDecode(String),

    // ── Rendering / export errors ─────────────────────────────────────────
    /// A Mermaid diagram could not be rendered.
    #[error("Diagram rendering failed: {0}")]
    DiagramRendering(String),

    /// There is no rendered document to export.
    #[error("Nothing to export: no document has been generated yet")]
    NothingToExport,

    /// No rasterizer capability is available.
    #[error("PDF export is unavailable: no rasterizer configured")]
    ExportUnavailable,

    /// The rasterizer failed or produced an unreadable image.
    #[error("Rasterisation failed: {0}")]
    Rasterisation(String),

    /// lopdf could not assemble the output document.
    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocGenError {
    /// True for failures of the generation request itself (status, transport, decode).
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            DocGenError::GenerationStatus { .. }
                | DocGenError::GenerationTransport(_)
                | DocGenError::GenerationDecode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_display_names_file() {
        let e = DocGenError::UnsupportedFileType {
            name: "data.csv".into(),
        };
        assert!(e.to_string().contains("data.csv"), "got: {e}");
    }

    #[test]
    fn status_display_includes_code() {
        let e = DocGenError::GenerationStatus { status: 503 };
        assert!(e.to_string().contains("503"));
    }

    #[test]
    fn generation_failure_classification() {
        assert!(DocGenError::GenerationStatus { status: 400 }.is_generation_failure());
        assert!(DocGenError::GenerationTransport("reset".into()).is_generation_failure());
        assert!(!DocGenError::NothingToExport.is_generation_failure());
    }
}
