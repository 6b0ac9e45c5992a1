//! Injected capabilities: PDF text extraction, diagram rendering, rasterisation.
//!
//! The session logic only depends on these traits. Concrete backends are
//! resolved once at startup by [`Capabilities::from_config`]; a backend that
//! cannot be resolved is simply absent, and the state machine disables the
//! operations that need it (a PDF upload falls back to the unsupported-type
//! path, the download trigger refuses).

use crate::config::GeneratorConfig;
use crate::error::DocGenError;
use crate::pipeline::diagram::CommandDiagramRenderer;
use crate::pipeline::export::CommandRasterizer;
use crate::pipeline::ingest::PdfiumTextExtractor;
use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Extracts text from PDF bytes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Text items of every page, pages in 1-indexed order, items in reading order.
    async fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<String>>, DocGenError>;
}

/// Turns Mermaid source into SVG markup.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    async fn render_svg(&self, source: &str) -> Result<String, DocGenError>;
}

/// Options handed to a [`Rasterizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Upscale factor relative to CSS pixels.
    pub scale: f32,
    /// Background colour behind transparent regions.
    pub background: [u8; 3],
}

/// Draws a standalone HTML page into a pixel image.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(
        &self,
        html_page: &str,
        options: &RasterOptions,
    ) -> Result<DynamicImage, DocGenError>;
}

/// Which capabilities are available, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityFlags {
    pub pdf_text: bool,
    pub diagrams: bool,
    pub export: bool,
}

/// The set of resolved capability backends.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub text_extractor: Option<Arc<dyn TextExtractor>>,
    pub diagram_renderer: Option<Arc<dyn DiagramRenderer>>,
    pub rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("flags", &self.flags())
            .finish()
    }
}

impl Capabilities {
    /// No capability at all; every optional operation is disabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolve the default backends from the configuration.
    ///
    /// pdfium is probed once here; when it cannot be bound, PDF context is disabled
    /// for the session. Diagram rendering and rasterisation exist only when a
    /// command line is configured.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let text_extractor: Option<Arc<dyn TextExtractor>> =
            match PdfiumTextExtractor::probe(config.pdfium_lib_path.clone()) {
                Ok(extractor) => Some(Arc::new(extractor)),
                Err(e) => {
                    warn!("PDF context disabled: {}", e);
                    None
                }
            };

        let diagram_renderer = config.diagram_command.as_deref().map(|cmd| {
            Arc::new(CommandDiagramRenderer::new(cmd)) as Arc<dyn DiagramRenderer>
        });

        let rasterizer = config
            .rasterizer_command
            .as_deref()
            .map(|cmd| Arc::new(CommandRasterizer::new(cmd)) as Arc<dyn Rasterizer>);

        let caps = Self {
            text_extractor,
            diagram_renderer,
            rasterizer,
        };
        info!("Resolved capabilities: {:?}", caps.flags());
        caps
    }

    pub fn with_text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = Some(extractor);
        self
    }

    pub fn with_diagram_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.diagram_renderer = Some(renderer);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn flags(&self) -> CapabilityFlags {
        CapabilityFlags {
            pdf_text: self.text_extractor.is_some(),
            diagrams: self.diagram_renderer.is_some(),
            export: self.rasterizer.is_some(),
        }
    }
}
