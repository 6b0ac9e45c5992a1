//! CLI binary for domain-docgen.
//!
//! A thin shim over the library crate: flags become a `GeneratorConfig`,
//! inputs become session messages, and the resulting document is printed,
//! written as HTML, or exported as PDF.

use anyhow::{bail, Context, Result};
use clap::Parser;
use domain_docgen::pipeline::diagram::DEFAULT_DIAGRAM_COMMAND;
use domain_docgen::pipeline::export::DEFAULT_RASTERIZER_COMMAND;
use domain_docgen::pipeline::render::standalone_html;
use domain_docgen::{
    compose_prompt, Controller, DocGenError, DocumentArea, Effect, FileHandle, GeneratorConfig,
    Locale, Messages, Msg, SessionObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows the running effect on a spinner and logs a line when it finishes.
struct SpinnerObserver {
    bar: ProgressBar,
    started: std::sync::Mutex<Option<Instant>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("docgen");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            started: std::sync::Mutex::new(None),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SessionObserver for SpinnerObserver {
    fn on_effect_started(&self, effect: &Effect) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("{}…", effect.label()));
    }

    fn on_effect_finished(&self, effect: &Effect) {
        let elapsed = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            effect.label(),
            dim(&format!("{elapsed:.1}s"))
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a document and print its Markdown
  docgen "Sistema de gestión de tareas"

  # Use a PDF as context and export the rendered result
  docgen --file requisitos.pdf --pdf "Modelo de dominio de la biblioteca"

  # Render diagrams with the Mermaid CLI and write a standalone HTML page
  docgen --diagrams --html dominio.html "E-commerce"

  # Show the exact prompt without calling the API
  docgen --dry-run --context "Usuarios y pedidos" "Modelo de pedidos"

INPUT ORDER:
  --context is applied first, then --file. Like picking a file in the form,
  --file replaces any context typed before it.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          API key sent as the `key` query parameter
  DOCGEN_ENDPOINT         Override the API base URL
  DOCGEN_MODEL            Override the model ID
  DOCGEN_DIAGRAM_CMD      Diagram renderer command ({input}, {output})
  DOCGEN_RASTERIZER_CMD   HTML→PNG command ({input}, {output}, {scale}, {background})
  PDFIUM_LIB_PATH         Path to libpdfium for PDF context files
"#;

/// Generate domain-model documents with a hosted language model.
#[derive(Parser, Debug)]
#[command(
    name = "docgen",
    version,
    about = "Generate domain-model documents (Markdown, HTML, PDF) with a language model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// What the document should describe.
    instruction: Option<String>,

    /// Context text sent ahead of the instruction.
    #[arg(long)]
    context: Option<String>,

    /// Context file: .txt, .md or .pdf.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// API base URL.
    #[arg(long, env = "DOCGEN_ENDPOINT")]
    endpoint: Option<String>,

    /// Model ID.
    #[arg(long, env = "DOCGEN_MODEL")]
    model: Option<String>,

    /// Language of the prompt and of fixed messages.
    #[arg(long, env = "DOCGEN_LOCALE", value_enum, default_value = "es")]
    locale: LocaleArg,

    /// Request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "DOCGEN_TIMEOUT")]
    timeout: Option<u64>,

    /// Render diagrams with the default Mermaid CLI command.
    #[arg(long)]
    diagrams: bool,

    /// Custom diagram renderer command line.
    #[arg(long, env = "DOCGEN_DIAGRAM_CMD")]
    diagram_cmd: Option<String>,

    /// Custom HTML→PNG command line used for PDF export.
    #[arg(long, env = "DOCGEN_RASTERIZER_CMD")]
    rasterizer_cmd: Option<String>,

    /// Explicit pdfium library file.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<String>,

    /// Write the rendered document as a standalone HTML page.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Export the rendered document as PDF into --output-dir.
    #[arg(long)]
    pdf: bool,

    /// Directory receiving the exported PDF.
    #[arg(long, env = "DOCGEN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Rasterisation scale for PDF export (0.5–4.0).
    #[arg(long, default_value_t = 2.0)]
    scale: f32,

    /// Print the composed prompt and exit without calling the API.
    #[arg(long)]
    dry_run: bool,

    /// Print the rendered document as JSON instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "DOCGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCGEN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LocaleArg {
    Es,
    En,
}

impl From<LocaleArg> for Locale {
    fn from(v: LocaleArg) -> Self {
        match v {
            LocaleArg::Es => Locale::Es,
            LocaleArg::En => Locale::En,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let mut controller = Controller::from_config(config).context("Failed to set up session")?;

    let spinner = if show_progress {
        let obs = SpinnerObserver::new();
        controller = controller.with_observer(obs.clone());
        Some(obs)
    } else {
        None
    };

    // ── Inputs ───────────────────────────────────────────────────────────
    if let Some(ref instruction) = cli.instruction {
        controller
            .dispatch(Msg::InstructionChanged(instruction.clone()))
            .await;
    }
    if let Some(ref context) = cli.context {
        controller.dispatch(Msg::ContextChanged(context.clone())).await;
    }
    if let Some(ref path) = cli.file {
        controller
            .dispatch(Msg::FileSelected(FileHandle::from_path(path)))
            .await;
        if controller.state().file_name().is_none() {
            finish(&spinner);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Err(DocGenError::UnsupportedFileType { name }.into());
        }
        if Messages::is_context_error(controller.state().context()) {
            finish(&spinner);
            bail!("{}", controller.state().context());
        }
    }

    if cli.dry_run {
        finish(&spinner);
        let state = controller.state();
        println!(
            "{}",
            compose_prompt(state.instruction(), state.context(), state.locale())
        );
        return Ok(());
    }

    if !controller.state().can_generate() {
        finish(&spinner);
        bail!("Nothing to generate: provide an instruction, --context or --file");
    }

    // ── Generate ─────────────────────────────────────────────────────────
    controller.dispatch(Msg::GenerateClicked).await;

    let doc = match controller.state().document() {
        DocumentArea::Rendered(doc) => doc.clone(),
        DocumentArea::Notice(notice) => {
            finish(&spinner);
            bail!("{notice}");
        }
        DocumentArea::Empty => {
            finish(&spinner);
            bail!("No document was produced");
        }
    };

    if let Some(ref path) = cli.html {
        let page = standalone_html(&doc.html, &controller.config().export, "Documento de dominio");
        tokio::fs::write(path, page)
            .await
            .with_context(|| format!("Failed to write HTML to {}", path.display()))?;
    }

    // ── Export ───────────────────────────────────────────────────────────
    if cli.pdf {
        controller.dispatch(Msg::DownloadClicked).await;
        if controller.state().last_export().is_none() {
            finish(&spinner);
            bail!("PDF export failed; run with -v for details");
        }
    }
    finish(&spinner);

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&doc).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(doc.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !doc.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        if let Some(ref path) = cli.html {
            eprintln!("{} HTML  →  {}", green("✔"), bold(&path.display().to_string()));
        }
        if let Some(pdf) = controller.state().last_export() {
            eprintln!(
                "{} PDF   →  {}  {}",
                green("✔"),
                bold(&pdf.path.display().to_string()),
                dim(&format!("{} page(s), {} bytes", pdf.page_count, pdf.bytes)),
            );
        }
        if doc.diagram_count > 0 && !controller.state().capabilities().diagrams {
            eprintln!(
                "{} {} diagram(s) left as source; pass --diagrams to render them",
                red("!"),
                doc.diagram_count
            );
        }
    }

    Ok(())
}

fn finish(spinner: &Option<Arc<SpinnerObserver>>) {
    if let Some(s) = spinner {
        s.finish();
    }
}

/// Map CLI args to `GeneratorConfig`.
fn build_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut builder = GeneratorConfig::builder()
        .api_key(cli.api_key.clone())
        .locale(cli.locale.into())
        .request_timeout_secs(cli.timeout)
        .scale(cli.scale)
        .output_dir(cli.output_dir.clone());

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }

    match (&cli.diagram_cmd, cli.diagrams) {
        (Some(cmd), _) => builder = builder.diagram_command(cmd.clone()),
        (None, true) => builder = builder.diagram_command(DEFAULT_DIAGRAM_COMMAND),
        (None, false) => {}
    }
    match (&cli.rasterizer_cmd, cli.pdf) {
        (Some(cmd), _) => builder = builder.rasterizer_command(cmd.clone()),
        (None, true) => builder = builder.rasterizer_command(DEFAULT_RASTERIZER_COMMAND),
        (None, false) => {}
    }

    builder.build().context("Invalid configuration")
}
