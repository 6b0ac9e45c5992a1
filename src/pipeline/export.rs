//! PDF export: rasterise the rendered document and slice it onto A4 pages.
//!
//! The whole document is drawn into one tall image. That image is embedded
//! once as an XObject and placed on every page, shifted up by one slice
//! height per page, so each page shows the next 295 mm of the document.

use crate::capabilities::{RasterOptions, Rasterizer};
use crate::config::ExportSettings;
use crate::error::DocGenError;
use crate::output::ExportedPdf;
use crate::pipeline::command::{scratch_dir, CommandTemplate};
use crate::pipeline::render::standalone_html;
use async_trait::async_trait;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Default HTML→PNG invocation.
pub const DEFAULT_RASTERIZER_COMMAND: &str =
    "wkhtmltoimage --zoom {scale} --format png {input} {output}";

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Remaining heights below this are rounding noise, not another page.
const EPSILON_MM: f32 = 1e-3;

const IMAGE_NAME: &str = "Im0";

// ── Layout ───────────────────────────────────────────────────────────────

/// Where the rasterised image lands on each page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    /// Height of the placed image, in mm, at the page width.
    pub image_height_mm: f32,
    /// Vertical offset of the image top on each page: `0, -slice, -2·slice, …`.
    pub offsets_mm: Vec<f32>,
}

impl PagePlan {
    /// Lay out an image of `px_width × px_height` pixels.
    ///
    /// Always yields at least one page; the page count is
    /// `ceil(image_height / slice_height)`.
    pub fn compute(px_width: u32, px_height: u32, settings: &ExportSettings) -> Self {
        let image_height_mm = if px_width == 0 {
            0.0
        } else {
            px_height as f32 * settings.page_width_mm / px_width as f32
        };
        let pages = ((image_height_mm - EPSILON_MM) / settings.slice_height_mm)
            .ceil()
            .max(1.0) as usize;
        let offsets_mm = (0..pages)
            .map(|i| -(i as f32) * settings.slice_height_mm)
            .collect();
        Self {
            image_height_mm,
            offsets_mm,
        }
    }

    pub fn page_count(&self) -> usize {
        self.offsets_mm.len()
    }
}

/// Composite `image` over an opaque `background`, dropping the alpha channel.
pub fn flatten_onto_background(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        out.put_pixel(
            x,
            y,
            Rgb([
                blend(r, background[0]),
                blend(g, background[1]),
                blend(b, background[2]),
            ]),
        );
    }
    out
}

// ── Assembly ─────────────────────────────────────────────────────────────

/// Build the PDF bytes: one shared image XObject, one page per plan offset.
pub fn assemble_pdf(
    image: &RgbImage,
    plan: &PagePlan,
    settings: &ExportSettings,
) -> Result<Vec<u8>, DocGenError> {
    let (px_w, px_h) = image.dimensions();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(image.as_raw())
        .map_err(|e| DocGenError::PdfAssembly(format!("compress image: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| DocGenError::PdfAssembly(format!("compress image: {e}")))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_w as i64,
                "Height" => px_h as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "FlateDecode",
            },
            compressed,
        )
        .with_compression(false),
    );
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { IMAGE_NAME => image_id },
    });

    let page_w = settings.page_width_mm * PT_PER_MM;
    let paper_h = settings.paper_height_mm * PT_PER_MM;
    let image_h = plan.image_height_mm * PT_PER_MM;

    let mut kids: Vec<Object> = Vec::with_capacity(plan.page_count());
    for offset_mm in &plan.offsets_mm {
        let bottom = paper_h - (offset_mm * PT_PER_MM + image_h);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_w.into(),
                        0.0_f32.into(),
                        0.0_f32.into(),
                        image_h.into(),
                        0.0_f32.into(),
                        bottom.into(),
                    ],
                ),
                Operation::new("Do", vec![IMAGE_NAME.into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| DocGenError::PdfAssembly(format!("page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.0_f32.into(), 0.0_f32.into(), page_w.into(), paper_h.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DocGenError::PdfAssembly(format!("serialise: {e}")))?;
    Ok(bytes)
}

// ── Export ───────────────────────────────────────────────────────────────

/// Rasterise `html` and write `settings.file_name` into `output_dir`.
///
/// Refuses with [`DocGenError::NothingToExport`] when there is no content and
/// with [`DocGenError::ExportUnavailable`] when no rasterizer is available.
/// The file is written atomically (temp file + rename).
pub async fn export_pdf(
    html: Option<&str>,
    rasterizer: Option<&dyn Rasterizer>,
    settings: &ExportSettings,
    output_dir: &Path,
) -> Result<ExportedPdf, DocGenError> {
    let html = html
        .filter(|h| !h.trim().is_empty())
        .ok_or(DocGenError::NothingToExport)?;
    let rasterizer = rasterizer.ok_or(DocGenError::ExportUnavailable)?;

    let page = standalone_html(html, settings, &settings.file_name);
    let options = RasterOptions {
        scale: settings.scale,
        background: settings.background,
    };
    let raster = rasterizer.rasterize(&page, &options).await?;
    debug!(
        "Rasterised document to {}×{} px",
        raster.width(),
        raster.height()
    );

    let owned_settings = settings.clone();
    let (bytes, page_count) = tokio::task::spawn_blocking(move || {
        let flat = flatten_onto_background(&raster, owned_settings.background);
        let plan = PagePlan::compute(flat.width(), flat.height(), &owned_settings);
        assemble_pdf(&flat, &plan, &owned_settings).map(|b| (b, plan.page_count()))
    })
    .await
    .map_err(|e| DocGenError::Internal(format!("Task join error: {e}")))??;

    let path = output_dir.join(&settings.file_name);
    let write_err = |source: std::io::Error| DocGenError::OutputWriteFailed {
        path: path.clone(),
        source,
    };
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(write_err)?;
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_err)?;

    info!(
        "Exported {} page(s), {} bytes to {}",
        page_count,
        bytes.len(),
        path.display()
    );
    Ok(ExportedPdf {
        path,
        page_count,
        bytes: bytes.len(),
    })
}

// ── Command-line rasterizer ──────────────────────────────────────────────

/// [`Rasterizer`] that shells out to an HTML→PNG program.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    command: CommandTemplate,
}

impl CommandRasterizer {
    /// `command` uses `{input}`, `{output}`, `{scale}` and `{background}` placeholders.
    pub fn new(command: &str) -> Self {
        Self {
            command: CommandTemplate::parse(command),
        }
    }
}

impl Default for CommandRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_RASTERIZER_COMMAND)
    }
}

#[async_trait]
impl Rasterizer for CommandRasterizer {
    async fn rasterize(
        &self,
        html_page: &str,
        options: &RasterOptions,
    ) -> Result<DynamicImage, DocGenError> {
        let dir = scratch_dir()?;
        let input = dir.path().join("document.html");
        let output = dir.path().join("document.png");
        tokio::fs::write(&input, html_page)
            .await
            .map_err(|e| DocGenError::Rasterisation(format!("write page: {e}")))?;

        let [r, g, b] = options.background;
        let background = format!("#{r:02x}{g:02x}{b:02x}");
        let scale = options.scale.to_string();
        let input_str = input.to_string_lossy();
        let output_str = output.to_string_lossy();
        self.command
            .run(&[
                ("input", &input_str),
                ("output", &output_str),
                ("scale", &scale),
                ("background", &background),
            ])
            .await
            .map_err(DocGenError::Rasterisation)?;

        let png = tokio::fs::read(&output)
            .await
            .map_err(|e| DocGenError::Rasterisation(format!("read image: {e}")))?;
        image::load_from_memory(&png)
            .map_err(|e| DocGenError::Rasterisation(format!("decode image: {e}")))
    }
}
