//! Configuration types for document generation and export.
//!
//! All behaviour is controlled through [`GeneratorConfig`], built via its
//! [`GeneratorConfigBuilder`]. Keeping every knob in one struct makes it easy
//! to share a config between the controller, the capabilities and the CLI.

use crate::error::DocGenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default base URL of the generative-language REST API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for `generateContent`.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Fixed name of the exported PDF.
pub const DEFAULT_PDF_FILE_NAME: &str = "documento_dominio.pdf";

/// Configuration for a generation session.
///
/// # Example
/// ```rust
/// use domain_docgen::{GeneratorConfig, Locale};
///
/// let config = GeneratorConfig::builder()
///     .model("gemini-2.0-flash")
///     .locale(Locale::En)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.0-flash");
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    /// Base URL of the API; the request goes to `{endpoint}/models/{model}:generateContent`.
    pub endpoint: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// API key appended as the `key` query parameter. Default: empty.
    ///
    /// An empty key is forwarded as-is; authentication can then be injected by a
    /// proxy in front of the endpoint.
    pub api_key: String,

    /// Per-request timeout in seconds. Default: `None` (wait indefinitely).
    pub request_timeout_secs: Option<u64>,

    /// Language of the prompt text and of the fixed user-visible messages. Default: Spanish.
    pub locale: Locale,

    /// Rasterisation and page layout of the exported PDF.
    pub export: ExportSettings,

    /// Directory receiving the exported PDF. Default: current directory.
    pub output_dir: PathBuf,

    /// Explicit pdfium library file. If None, `PDFIUM_LIB_PATH` then the system library is used.
    pub pdfium_lib_path: Option<String>,

    /// Diagram renderer command line, e.g. `mmdc -i {input} -o {output} -t dark`.
    /// If None, diagrams are left as source blocks.
    pub diagram_command: Option<String>,

    /// HTML→PNG command line with `{input}`, `{output}`, `{scale}`, `{background}` placeholders.
    /// If None, PDF export is unavailable.
    pub rasterizer_command: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            request_timeout_secs: None,
            locale: Locale::default(),
            export: ExportSettings::default(),
            output_dir: PathBuf::from("."),
            pdfium_lib_path: None,
            diagram_command: None,
            rasterizer_command: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "<empty>" } else { "<redacted>" },
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("locale", &self.locale)
            .field("export", &self.export)
            .field("output_dir", &self.output_dir)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("diagram_command", &self.diagram_command)
            .field("rasterizer_command", &self.rasterizer_command)
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full `generateContent` URL, including the key query parameter.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.request_timeout_secs = secs.map(|s| s.max(1));
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn export(mut self, export: ExportSettings) -> Self {
        self.config.export = export;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.config.export.scale = scale.clamp(0.5, 4.0);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<String>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn diagram_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.diagram_command = Some(cmd.into());
        self
    }

    pub fn rasterizer_command(mut self, cmd: impl Into<String>) -> Self {
        self.config.rasterizer_command = Some(cmd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, DocGenError> {
        let c = &self.config;
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(DocGenError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(DocGenError::InvalidConfig("model must not be empty".into()));
        }
        c.export.validate()?;
        for (name, cmd) in [
            ("diagram", &c.diagram_command),
            ("rasterizer", &c.rasterizer_command),
        ] {
            if let Some(cmd) = cmd {
                if cmd.split_whitespace().next().is_none() {
                    return Err(DocGenError::InvalidConfig(format!(
                        "{name} command must not be empty"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

// ── Export settings ──────────────────────────────────────────────────────

/// Rasterisation and page layout of the exported PDF.
///
/// Defaults reproduce the display: 2× upscale on the dark `#1f2937` panel
/// background, A4 paper, 210 mm wide image sliced every 295 mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Upscale factor handed to the rasterizer. Default: 2.0.
    pub scale: f32,
    /// RGB background the rendered region is flattened onto. Default: `#1f2937`.
    pub background: [u8; 3],
    /// Width of the placed image and of the page, in mm. Default: 210.
    pub page_width_mm: f32,
    /// Vertical distance between successive page slices, in mm. Default: 295.
    pub slice_height_mm: f32,
    /// Paper height of every page, in mm. Default: 297 (A4).
    pub paper_height_mm: f32,
    /// Name of the single output file. Default: [`DEFAULT_PDF_FILE_NAME`].
    pub file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: [0x1f, 0x29, 0x37],
            page_width_mm: 210.0,
            slice_height_mm: 295.0,
            paper_height_mm: 297.0,
            file_name: DEFAULT_PDF_FILE_NAME.to_string(),
        }
    }
}

impl ExportSettings {
    /// Background as a CSS hex colour, e.g. `#1f2937`.
    pub fn background_hex(&self) -> String {
        let [r, g, b] = self.background;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    fn validate(&self) -> Result<(), DocGenError> {
        if !(self.page_width_mm > 0.0 && self.slice_height_mm > 0.0 && self.paper_height_mm > 0.0)
        {
            return Err(DocGenError::InvalidConfig(
                "page dimensions must be positive".into(),
            ));
        }
        if !self.file_name.ends_with(".pdf")
            || self.file_name.contains('/')
            || self.file_name.contains('\\')
        {
            return Err(DocGenError::InvalidConfig(format!(
                "output file name must be a bare *.pdf name, got '{}'",
                self.file_name
            )));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Language of prompts and fixed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Spanish (default).
    #[default]
    Es,
    /// English.
    En,
}
