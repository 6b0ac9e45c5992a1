//! Pipeline stages for document generation.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ (prompts) ──▶ generate ──▶ render ──▶ diagram ──▶ export
//! (context)   (compose)    (HTTP)      (md→html)  (mermaid)   (PDF)
//! ```
//!
//! 1. [`ingest`]   : turn an uploaded `.txt` / `.md` / `.pdf` into context text
//! 2. [`generate`] : one `generateContent` call; the only stage with network I/O
//! 3. [`render`]   : Mermaid blocks to containers, Markdown to HTML
//! 4. [`diagram`]  : post-mount diagram pass over the rendered HTML
//! 5. [`export`]   : rasterise, slice into A4 pages, assemble and write the PDF

pub(crate) mod command;
pub mod diagram;
pub mod export;
pub mod generate;
pub mod ingest;
pub mod render;
