//! Session state machine.
//!
//! [`update`] is pure: it applies one [`Msg`] to the [`SessionState`] and
//! returns the [`Effect`]s the caller must run. Effects report back with a
//! completion message carrying the sequence number they were started under;
//! completions whose number is no longer current are dropped, so a slow PDF
//! extraction cannot overwrite the context of a file chosen after it.

use crate::capabilities::CapabilityFlags;
use crate::config::Locale;
use crate::messages::Messages;
use crate::output::{ExportedPdf, RenderedDocument};
use crate::pipeline::ingest::{FileHandle, FileKind};
use crate::pipeline::render::{escape_text, render_markdown};
use crate::prompts::compose_prompt;

/// What the document area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentArea {
    #[default]
    Empty,
    Rendered(RenderedDocument),
    /// One of the fixed fallback or error messages.
    Notice(String),
}

impl DocumentArea {
    pub fn is_empty(&self) -> bool {
        matches!(self, DocumentArea::Empty)
    }

    /// HTML shown in the area, `None` while empty.
    pub fn display_html(&self) -> Option<String> {
        match self {
            DocumentArea::Empty => None,
            DocumentArea::Rendered(doc) => Some(doc.html.clone()),
            DocumentArea::Notice(text) => Some(format!("<p>{}</p>\n", escape_text(text))),
        }
    }
}

/// How a generation request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Text(String),
    /// The response had no candidate text.
    Empty,
    /// Transport or API failure, already logged.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    InstructionChanged(String),
    ContextChanged(String),
    FileSelected(FileHandle),
    FileRemoved,
    ContextLoaded { upload: u64, context: String },
    GenerateClicked,
    GenerationCompleted { seq: u64, outcome: GenerationOutcome },
    DiagramsRendered { seq: u64, html: String },
    DownloadClicked,
    ExportFinished(Result<ExportedPdf, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadContext {
        upload: u64,
        handle: FileHandle,
        kind: FileKind,
    },
    Generate {
        seq: u64,
        prompt: String,
    },
    RenderDiagrams {
        seq: u64,
        html: String,
    },
    ExportPdf {
        html: String,
    },
}

impl Effect {
    /// Short label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            Effect::LoadContext {
                kind: FileKind::Pdf,
                ..
            } => "Reading PDF",
            Effect::LoadContext { .. } => "Reading file",
            Effect::Generate { .. } => "Generating document",
            Effect::RenderDiagrams { .. } => "Rendering diagrams",
            Effect::ExportPdf { .. } => "Exporting PDF",
        }
    }
}

/// Everything the session holds between messages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    instruction: String,
    context: String,
    file_name: Option<String>,
    document: DocumentArea,
    generating: bool,
    reading_pdf: bool,
    exporting: bool,
    capabilities: CapabilityFlags,
    locale: Locale,
    upload_seq: u64,
    generation_seq: u64,
    last_export: Option<ExportedPdf>,
}

/// Read-only snapshot for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub instruction: String,
    pub context: String,
    pub file_name: Option<String>,
    pub document: DocumentArea,
    pub generating: bool,
    pub reading_pdf: bool,
    pub exporting: bool,
    pub can_generate: bool,
    pub can_download: bool,
    pub placeholder: &'static str,
}

impl SessionState {
    pub fn new(locale: Locale, capabilities: CapabilityFlags) -> Self {
        Self {
            locale,
            capabilities,
            ..Self::default()
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn document(&self) -> &DocumentArea {
        &self.document
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_reading_pdf(&self) -> bool {
        self.reading_pdf
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.capabilities
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn last_export(&self) -> Option<&ExportedPdf> {
        self.last_export.as_ref()
    }

    pub fn messages(&self) -> &'static Messages {
        Messages::for_locale(self.locale)
    }

    /// Generation is allowed when nothing is loading and instruction or context has text.
    pub fn can_generate(&self) -> bool {
        !self.generating
            && !self.reading_pdf
            && !(self.instruction.trim().is_empty() && self.context.trim().is_empty())
    }

    /// Download is allowed when the document area has content and no export is running.
    pub fn can_download(&self) -> bool {
        !self.document.is_empty() && !self.exporting
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            instruction: self.instruction.clone(),
            context: self.context.clone(),
            file_name: self.file_name.clone(),
            document: self.document.clone(),
            generating: self.generating,
            reading_pdf: self.reading_pdf,
            exporting: self.exporting,
            can_generate: self.can_generate(),
            can_download: self.can_download(),
            placeholder: self.messages().placeholder,
        }
    }
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::InstructionChanged(text) => {
            state.instruction = text;
            Vec::new()
        }
        Msg::ContextChanged(text) => {
            state.context = text;
            Vec::new()
        }
        Msg::FileSelected(handle) => {
            state.upload_seq += 1;
            state.context.clear();
            let kind = handle.kind().effective(state.capabilities.pdf_text);
            match kind {
                FileKind::Unsupported => {
                    state.file_name = None;
                    state.reading_pdf = false;
                    state.context = state.messages().unsupported_file.to_string();
                    Vec::new()
                }
                FileKind::Pdf | FileKind::Text | FileKind::Markdown => {
                    state.file_name = Some(handle.name.clone());
                    state.reading_pdf = kind == FileKind::Pdf;
                    vec![Effect::LoadContext {
                        upload: state.upload_seq,
                        handle,
                        kind,
                    }]
                }
            }
        }
        Msg::FileRemoved => {
            state.upload_seq += 1;
            state.file_name = None;
            state.context.clear();
            state.reading_pdf = false;
            Vec::new()
        }
        Msg::ContextLoaded { upload, context } => {
            if upload == state.upload_seq {
                state.context = context;
                state.reading_pdf = false;
            }
            Vec::new()
        }
        Msg::GenerateClicked => {
            if !state.can_generate() {
                return (state, Vec::new());
            }
            state.generation_seq += 1;
            state.generating = true;
            state.document = DocumentArea::Empty;
            let prompt = compose_prompt(&state.instruction, &state.context, state.locale);
            vec![Effect::Generate {
                seq: state.generation_seq,
                prompt,
            }]
        }
        Msg::GenerationCompleted { seq, outcome } => {
            if seq != state.generation_seq {
                return (state, Vec::new());
            }
            state.generating = false;
            let messages = state.messages();
            match outcome {
                GenerationOutcome::Text(text) => {
                    let doc = render_markdown(&text);
                    let diagrams = doc.diagram_count > 0 && state.capabilities.diagrams;
                    let html = doc.html.clone();
                    state.document = DocumentArea::Rendered(doc);
                    if diagrams {
                        vec![Effect::RenderDiagrams { seq, html }]
                    } else {
                        Vec::new()
                    }
                }
                GenerationOutcome::Empty => {
                    state.document = DocumentArea::Notice(messages.empty_response.to_string());
                    Vec::new()
                }
                GenerationOutcome::Failed(_) => {
                    state.document = DocumentArea::Notice(messages.generation_failed.to_string());
                    Vec::new()
                }
            }
        }
        Msg::DiagramsRendered { seq, html } => {
            if seq == state.generation_seq {
                if let DocumentArea::Rendered(doc) = &mut state.document {
                    doc.html = html;
                }
            }
            Vec::new()
        }
        Msg::DownloadClicked => {
            if !state.can_download() || !state.capabilities.export {
                return (state, Vec::new());
            }
            match state.document.display_html() {
                Some(html) => {
                    state.exporting = true;
                    vec![Effect::ExportPdf { html }]
                }
                None => Vec::new(),
            }
        }
        Msg::ExportFinished(result) => {
            state.exporting = false;
            state.last_export = result.ok();
            Vec::new()
        }
    };

    (state, effects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_caps() -> CapabilityFlags {
        CapabilityFlags {
            pdf_text: true,
            diagrams: true,
            export: true,
        }
    }

    #[test]
    fn generate_needs_instruction_or_context() {
        let state = SessionState::new(Locale::Es, all_caps());
        assert!(!state.can_generate());
        let (state, _) = update(state, Msg::InstructionChanged("   ".into()));
        assert!(!state.can_generate());
        let (state, _) = update(state, Msg::ContextChanged("ctx".into()));
        assert!(state.can_generate());
    }

    #[test]
    fn generate_click_while_disabled_is_ignored() {
        let state = SessionState::new(Locale::Es, all_caps());
        let (state, effects) = update(state, Msg::GenerateClicked);
        assert!(effects.is_empty());
        assert!(!state.is_generating());
    }

    #[test]
    fn generation_clears_document_and_blocks_second_click() {
        let state = SessionState::new(Locale::Es, all_caps());
        let (state, _) = update(state, Msg::InstructionChanged("Tareas".into()));
        let (state, effects) = update(state, Msg::GenerateClicked);
        assert_eq!(effects.len(), 1);
        assert!(state.is_generating());
        assert!(state.document().is_empty());
        let (_, effects) = update(state, Msg::GenerateClicked);
        assert!(effects.is_empty());
    }

    #[test]
    fn reading_pdf_blocks_generation() {
        let state = SessionState::new(Locale::Es, all_caps());
        let (state, _) = update(state, Msg::InstructionChanged("x".into()));
        let handle = FileHandle::from_bytes("a.pdf", None, vec![1]);
        let (state, _) = update(state, Msg::FileSelected(handle));
        assert!(state.is_reading_pdf());
        assert!(!state.can_generate());
    }

    #[test]
    fn diagrams_effect_follows_stored_document() {
        let state = SessionState::new(Locale::Es, all_caps());
        let (state, _) = update(state, Msg::InstructionChanged("x".into()));
        let (state, _) = update(state, Msg::GenerateClicked);
        let text = "# T\n\n```mermaid\ngraph TD\n```".to_string();
        let (state, effects) = update(
            state,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Text(text),
            },
        );
        let Some(Effect::RenderDiagrams { seq, html }) = effects.first() else {
            panic!("expected a diagram pass, got {effects:?}");
        };
        assert_eq!(*seq, 1);
        assert_eq!(state.document().display_html().as_ref(), Some(html));
    }

    #[test]
    fn no_diagram_pass_without_renderer() {
        let flags = CapabilityFlags {
            diagrams: false,
            ..all_caps()
        };
        let state = SessionState::new(Locale::Es, flags);
        let (state, _) = update(state, Msg::InstructionChanged("x".into()));
        let (state, _) = update(state, Msg::GenerateClicked);
        let (_, effects) = update(
            state,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Text("```mermaid\ngraph TD\n```".into()),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn download_requires_export_capability() {
        let flags = CapabilityFlags {
            export: false,
            ..all_caps()
        };
        let mut state = SessionState::new(Locale::Es, flags);
        state.document = DocumentArea::Notice("n".into());
        assert!(state.can_download());
        let (state, effects) = update(state, Msg::DownloadClicked);
        assert!(effects.is_empty());
        assert!(!state.is_exporting());
    }

    #[test]
    fn export_failure_clears_flag() {
        let mut state = SessionState::new(Locale::Es, all_caps());
        state.document = DocumentArea::Notice("n".into());
        let (state, effects) = update(state, Msg::DownloadClicked);
        assert_eq!(effects.len(), 1);
        assert!(state.is_exporting());
        assert!(!state.can_download());
        let (state, _) = update(state, Msg::ExportFinished(Err("boom".into())));
        assert!(!state.is_exporting());
        assert!(state.can_download());
        assert!(state.last_export().is_none());
    }

    #[test]
    fn notice_html_is_escaped() {
        let area = DocumentArea::Notice("a < b".into());
        assert_eq!(area.display_html().as_deref(), Some("<p>a &lt; b</p>\n"));
    }
}
