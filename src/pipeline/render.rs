//! Content rendering: generated Markdown → displayable HTML.
//!
//! Mermaid blocks are lifted out before Markdown parsing and put back as
//! `<div class="mermaid">` containers afterwards. Lifting them out keeps a
//! blank line inside a diagram from splitting the container into an HTML block
//! plus stray paragraphs.

use crate::config::ExportSettings;
use crate::output::RenderedDocument;
use crate::pipeline::diagram::DIAGRAM_CLASS;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use tracing::debug;

static RE_DIAGRAM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```mermaid\n([\s\S]*?)\n```").unwrap());

const MARKER_PREFIX: &str = "DOCGENDIAGRAM";
const MARKER_SUFFIX: &str = "END";

/// Convert the model's text into a [`RenderedDocument`].
pub fn render_markdown(text: &str) -> RenderedDocument {
    let normalised = text.replace("\r\n", "\n");

    let mut sources: Vec<String> = Vec::new();
    let lifted = RE_DIAGRAM_BLOCK.replace_all(&normalised, |caps: &regex::Captures<'_>| {
        let marker = format!("\n\n{MARKER_PREFIX}{}{MARKER_SUFFIX}\n\n", sources.len());
        sources.push(caps[1].to_string());
        marker
    });

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(&lifted, options);
    let mut body = String::with_capacity(lifted.len() * 3 / 2);
    html::push_html(&mut body, parser);

    for (i, source) in sources.iter().enumerate() {
        let marker = format!("{MARKER_PREFIX}{i}{MARKER_SUFFIX}");
        let container = diagram_container(source);
        let para = format!("<p>{marker}</p>\n");
        body = if body.contains(&para) {
            body.replace(&para, &format!("{container}\n"))
        } else {
            body.replace(&marker, &container)
        };
    }

    debug!(
        "Rendered {} chars of Markdown into {} chars of HTML ({} diagrams)",
        text.len(),
        body.len(),
        sources.len()
    );

    RenderedDocument {
        markdown: text.to_string(),
        html: body,
        diagram_count: sources.len(),
    }
}

/// `<div class="mermaid">` container whose text content is `source`.
pub fn diagram_container(source: &str) -> String {
    format!(
        "<div class=\"{DIAGRAM_CLASS}\">{}</div>",
        escape_text(source)
    )
}

/// Escape the two characters that would change how text content parses.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;")
}

/// Inverse of [`escape_text`].
pub fn unescape_text(s: &str) -> String {
    s.replace("&lt;", "<").replace("&amp;", "&")
}

/// Wrap an HTML fragment in a complete page with the dark document theme.
///
/// The fragment lands in `#document-content`, the region the exporter rasterises.
pub fn standalone_html(fragment: &str, settings: &ExportSettings, title: &str) -> String {
    let bg = settings.background_hex();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  html, body {{ margin: 0; background: {bg}; color: #e5e7eb; font-family: sans-serif; }}
  #document-content {{ max-width: 42rem; margin: 0 auto; padding: 2rem; line-height: 1.6; }}
  h1 {{ font-size: 1.875rem; }} h2 {{ font-size: 1.5rem; }} h3 {{ font-size: 1.25rem; }}
  table {{ border-collapse: collapse; }}
  th, td {{ border: 1px solid #4b5563; padding: 0.25rem 0.5rem; }}
  pre, code {{ background: #111827; }}
  .{DIAGRAM_CLASS} {{ text-align: center; white-space: pre; }}
</style>
</head>
<body>
<div id="document-content">
{fragment}
</div>
</body>
</html>
"#,
        title = escape_text(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_becomes_html() {
        let doc = render_markdown("# Model\n\nSome *text*.");
        assert!(doc.html.contains("<h1>Model</h1>"));
        assert!(doc.html.contains("<em>text</em>"));
        assert_eq!(doc.diagram_count, 0);
    }

    #[test]
    fn tables_are_rendered() {
        let doc = render_markdown("| A | B |\n|---|---|\n| 1 | 2 |\n");
        assert!(doc.html.contains("<table>"));
        assert!(doc.html.contains("<td>2</td>"));
    }

    #[test]
    fn diagram_block_becomes_container() {
        let src = "classDiagram\n  Task --> User\n  Task : +title";
        let text = format!("Intro\n\n```mermaid\n{src}\n```\n\nOutro");
        let doc = render_markdown(&text);
        let expected = format!("<div class=\"mermaid\">{src}</div>");
        assert!(doc.html.contains(&expected), "html: {}", doc.html);
        assert!(!doc.html.contains("```"));
        assert!(!doc.html.contains(MARKER_PREFIX));
        assert_eq!(doc.diagram_count, 1);
    }

    #[test]
    fn blank_lines_inside_diagram_stay_in_one_container() {
        let src = "graph TD\n  A-->B\n\n  B-->C";
        let doc = render_markdown(&format!("```mermaid\n{src}\n```"));
        assert!(doc.html.contains(&format!("<div class=\"mermaid\">{src}</div>")));
        assert!(!doc.html.contains("<p>B-->C"));
    }

    #[test]
    fn multiple_diagrams_keep_order() {
        let text = "```mermaid\ngraph A\n```\n\ntext\n\n```mermaid\ngraph B\n```\n";
        let doc = render_markdown(text);
        let a = doc.html.find("graph A").unwrap();
        let b = doc.html.find("graph B").unwrap();
        assert!(a < b);
        assert_eq!(doc.diagram_count, 2);
    }

    #[test]
    fn crlf_input_is_normalised() {
        let doc = render_markdown("```mermaid\r\ngraph LR\r\n  X-->Y\r\n```\r\n");
        assert!(doc.html.contains("<div class=\"mermaid\">graph LR\n  X-->Y</div>"));
    }

    #[test]
    fn other_code_blocks_are_untouched() {
        let doc = render_markdown("```rust\nfn main() {}\n```\n");
        assert!(doc.html.contains("<pre><code class=\"language-rust\">"));
        assert_eq!(doc.diagram_count, 0);
    }

    #[test]
    fn angle_brackets_are_escaped_in_container() {
        let doc = render_markdown("```mermaid\nclassDiagram\n  A <|-- B\n```");
        assert!(doc.html.contains("A &lt;|-- B"));
        assert_eq!(unescape_text("A &lt;|-- B &amp; C"), "A <|-- B & C");
    }

    #[test]
    fn standalone_page_embeds_fragment_and_background() {
        let page = standalone_html("<p>x</p>", &ExportSettings::default(), "Doc");
        assert!(page.contains("<div id=\"document-content\">\n<p>x</p>"));
        assert!(page.contains("#1f2937"));
    }
}
