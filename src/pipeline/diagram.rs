//! Diagram pass: render Mermaid containers after the document is mounted.
//!
//! The pass scans `<div class="mermaid">` containers and swaps their source
//! for SVG produced by the [`DiagramRenderer`] capability. Handled containers
//! are tagged with `data-processed`, which the scan does not match, so
//! running the pass again over the same HTML changes nothing.

use crate::capabilities::DiagramRenderer;
use crate::error::DocGenError;
use crate::pipeline::command::{scratch_dir, CommandTemplate};
use crate::pipeline::render::unescape_text;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// CSS class selecting diagram containers.
pub const DIAGRAM_CLASS: &str = "mermaid";

/// Default Mermaid CLI invocation.
pub const DEFAULT_DIAGRAM_COMMAND: &str = "mmdc -i {input} -o {output} -t dark -b transparent";

static RE_PENDING_CONTAINER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div class="mermaid">([\s\S]*?)</div>"#).unwrap());

/// Outcome of one diagram pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramPass {
    pub html: String,
    pub rendered: usize,
    pub failed: usize,
}

/// Render every pending diagram container in `html`.
///
/// A diagram that fails keeps its source and is tagged `data-processed="error"`.
pub async fn render_diagrams(renderer: &dyn DiagramRenderer, html: &str) -> DiagramPass {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut rendered = 0;
    let mut failed = 0;

    for caps in RE_PENDING_CONTAINER.captures_iter(html) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&html[last..whole.start()]);
        let source = unescape_text(body.as_str());
        match renderer.render_svg(&source).await {
            Ok(svg) => {
                rendered += 1;
                out.push_str(&format!(
                    "<div class=\"{DIAGRAM_CLASS}\" data-processed=\"true\">{svg}</div>"
                ));
            }
            Err(e) => {
                failed += 1;
                warn!("Diagram {} could not be rendered: {}", rendered + failed, e);
                out.push_str(&format!(
                    "<div class=\"{DIAGRAM_CLASS}\" data-processed=\"error\">{}</div>",
                    body.as_str()
                ));
            }
        }
        last = whole.end();
    }
    out.push_str(&html[last..]);

    debug!("Diagram pass: {} rendered, {} failed", rendered, failed);
    DiagramPass {
        html: out,
        rendered,
        failed,
    }
}

/// Number of containers the next pass would render.
pub fn pending_diagrams(html: &str) -> usize {
    RE_PENDING_CONTAINER.find_iter(html).count()
}

/// [`DiagramRenderer`] that shells out to a Mermaid CLI.
#[derive(Debug, Clone)]
pub struct CommandDiagramRenderer {
    command: CommandTemplate,
}

impl CommandDiagramRenderer {
    /// `command` uses `{input}` (a `.mmd` file) and `{output}` (the `.svg` to produce).
    pub fn new(command: &str) -> Self {
        Self {
            command: CommandTemplate::parse(command),
        }
    }
}

impl Default for CommandDiagramRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGRAM_COMMAND)
    }
}

#[async_trait]
impl DiagramRenderer for CommandDiagramRenderer {
    async fn render_svg(&self, source: &str) -> Result<String, DocGenError> {
        let dir = scratch_dir()?;
        let input = dir.path().join("diagram.mmd");
        let output = dir.path().join("diagram.svg");
        tokio::fs::write(&input, source)
            .await
            .map_err(|e| DocGenError::DiagramRendering(format!("write source: {e}")))?;

        let input_str = input.to_string_lossy();
        let output_str = output.to_string_lossy();
        self.command
            .run(&[("input", &input_str), ("output", &output_str)])
            .await
            .map_err(DocGenError::DiagramRendering)?;

        tokio::fs::read_to_string(&output)
            .await
            .map_err(|e| DocGenError::DiagramRendering(format!("read svg: {e}")))
    }
}
