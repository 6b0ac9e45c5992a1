//! # domain-docgen
//!
//! Generate domain-model documents with a hosted language model.
//!
//! A user supplies an instruction and, optionally, context (typed or read from
//! a `.txt`, `.md` or `.pdf` file). The crate composes a prompt asking for a
//! structured domain document, sends it to a `generateContent` endpoint,
//! renders the Markdown answer (tables and Mermaid diagrams included) to HTML,
//! and exports the rendered result as a multi-page A4 PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file ─▶ ingest ─▶ context ┐
//!                           ├─▶ compose ─▶ generate ─▶ render ─▶ diagrams ─▶ export
//! instruction ──────────────┘   (prompt)    (HTTP)    (md→html)  (mermaid)    (PDF)
//! ```
//!
//! The UI-facing logic is a pure state machine ([`session::update`]) driven
//! by a [`Controller`] that runs its effects. Optional backends (PDF text
//! extraction, diagram rendering, rasterisation) are injected as
//! [`Capabilities`]; when one is missing the operations needing it are
//! disabled instead of failing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_docgen::{Controller, GeneratorConfig, Msg};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY").unwrap_or_default())
//!         .build()?;
//!     let mut controller = Controller::from_config(config)?;
//!     controller
//!         .dispatch(Msg::InstructionChanged("Task management system".into()))
//!         .await;
//!     controller.dispatch(Msg::GenerateClicked).await;
//!     println!("{:?}", controller.state().document());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docgen` binary (clap + indicatif + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capabilities;
pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capabilities::{
    Capabilities, CapabilityFlags, DiagramRenderer, RasterOptions, Rasterizer, TextExtractor,
};
pub use config::{ExportSettings, GeneratorConfig, GeneratorConfigBuilder, Locale};
pub use controller::Controller;
pub use error::DocGenError;
pub use messages::Messages;
pub use observer::{NoopObserver, SessionObserver};
pub use output::{ExportedPdf, RenderedDocument};
pub use pipeline::generate::{GenerationClient, Generator};
pub use pipeline::ingest::{FileHandle, FileKind};
pub use prompts::compose_prompt;
pub use session::{update, DocumentArea, Effect, GenerationOutcome, Msg, SessionState, SessionView};
