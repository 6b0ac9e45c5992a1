//! Session scenarios driven through the pure `update` function.

use domain_docgen::{
    update, CapabilityFlags, DocumentArea, Effect, FileHandle, FileKind, GenerationOutcome,
    Locale, Messages, Msg, SessionState,
};

fn caps() -> CapabilityFlags {
    CapabilityFlags {
        pdf_text: true,
        diagrams: true,
        export: true,
    }
}

fn apply(state: SessionState, msgs: Vec<Msg>) -> (SessionState, Vec<Effect>) {
    msgs.into_iter().fold((state, Vec::new()), |(state, mut all), msg| {
        let (next, effects) = update(state, msg);
        all.extend(effects);
        (next, all)
    })
}

#[test]
fn csv_upload_is_rejected() {
    let state = SessionState::new(Locale::Es, caps());
    let handle = FileHandle::from_bytes("datos.csv", Some("text/csv".into()), b"a,b".to_vec());
    let (state, effects) = update(state, Msg::FileSelected(handle));

    assert!(effects.is_empty());
    assert_eq!(state.context(), "Error: Tipo de archivo no soportado.");
    assert_eq!(state.file_name(), None);
    assert!(!state.is_reading_pdf());
}

#[test]
fn csv_upload_replaces_context_and_drives_generate_button() {
    let csv = || FileHandle::from_bytes("datos.csv", Some("text/csv".into()), b"a,b".to_vec());

    // No instruction: the button follows the context field alone.
    let state = SessionState::new(Locale::Es, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::ContextChanged("Libros y socios".into()),
            Msg::FileSelected(csv()),
        ],
    );
    assert_eq!(state.context(), "Error: Tipo de archivo no soportado.");
    assert!(state.can_generate());
    let (state, _) = update(state, Msg::ContextChanged(String::new()));
    assert!(!state.can_generate());

    // With an instruction the button stays enabled.
    let state = SessionState::new(Locale::Es, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::InstructionChanged("Biblioteca".into()),
            Msg::FileSelected(csv()),
            Msg::ContextChanged(String::new()),
        ],
    );
    assert_eq!(state.file_name(), None);
    assert!(state.can_generate());
}

#[test]
fn pdf_without_extractor_is_rejected_like_unsupported() {
    let flags = CapabilityFlags {
        pdf_text: false,
        ..caps()
    };
    let state = SessionState::new(Locale::En, flags);
    let handle = FileHandle::from_bytes("requisitos.pdf", None, vec![0x25, 0x50]);
    let (state, effects) = update(state, Msg::FileSelected(handle));

    assert!(effects.is_empty());
    assert_eq!(state.context(), Messages::for_locale(Locale::En).unsupported_file);
    assert_eq!(state.file_name(), None);
}

#[test]
fn pdf_upload_loads_then_fills_context() {
    let state = SessionState::new(Locale::Es, caps());
    let handle = FileHandle::from_bytes("req.pdf", None, vec![1, 2, 3]);
    let (state, effects) = update(state, Msg::FileSelected(handle.clone()));

    assert_eq!(
        effects,
        vec![Effect::LoadContext {
            upload: 1,
            handle,
            kind: FileKind::Pdf
        }]
    );
    assert!(state.is_reading_pdf());
    assert_eq!(state.file_name(), Some("req.pdf"));
    assert_eq!(state.context(), "");

    let (state, _) = update(
        state,
        Msg::ContextLoaded {
            upload: 1,
            context: "Hello world".into(),
        },
    );
    assert!(!state.is_reading_pdf());
    assert_eq!(state.context(), "Hello world");
    assert!(state.can_generate());
}

#[test]
fn removing_file_clears_name_and_context() {
    let state = SessionState::new(Locale::Es, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::FileSelected(FileHandle::from_bytes("notes.md", None, b"# n".to_vec())),
            Msg::ContextLoaded {
                upload: 1,
                context: "# n".into(),
            },
            Msg::FileRemoved,
        ],
    );
    assert_eq!(state.file_name(), None);
    assert_eq!(state.context(), "");
}

#[test]
fn stale_extraction_does_not_overwrite_newer_state() {
    let state = SessionState::new(Locale::Es, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::FileSelected(FileHandle::from_bytes("slow.pdf", None, vec![1])),
            Msg::FileRemoved,
            Msg::ContextLoaded {
                upload: 1,
                context: "late text".into(),
            },
        ],
    );
    assert_eq!(state.context(), "");
    assert!(!state.is_reading_pdf());
}

#[test]
fn prompt_carries_context_before_instruction() {
    let state = SessionState::new(Locale::Es, caps());
    let (_, effects) = apply(
        state,
        vec![
            Msg::InstructionChanged("Sistema de biblioteca".into()),
            Msg::ContextChanged("Libros y socios".into()),
            Msg::GenerateClicked,
        ],
    );
    let [Effect::Generate { seq, prompt }] = effects.as_slice() else {
        panic!("expected one generate effect, got {effects:?}");
    };
    assert_eq!(*seq, 1);
    let ctx = prompt.find("Libros y socios").unwrap();
    let instr = prompt.find("Sistema de biblioteca").unwrap();
    assert!(ctx < instr);
    assert!(prompt.contains("```mermaid"));
}

#[test]
fn empty_candidates_show_fallback_message() {
    let state = SessionState::new(Locale::Es, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::InstructionChanged("x".into()),
            Msg::GenerateClicked,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Empty,
            },
        ],
    );
    assert_eq!(
        state.document(),
        &DocumentArea::Notice(
            "Lo siento, no pude generar un documento. Por favor, intenta con otra solicitud."
                .into()
        )
    );
    assert!(!state.is_generating());
    assert!(state.can_download());
}

#[test]
fn failed_request_shows_error_message() {
    let state = SessionState::new(Locale::En, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::InstructionChanged("x".into()),
            Msg::GenerateClicked,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Failed("status 500".into()),
            },
        ],
    );
    assert_eq!(
        state.document(),
        &DocumentArea::Notice(Messages::for_locale(Locale::En).generation_failed.into())
    );
    assert!(state.can_generate());
}

#[test]
fn rendered_document_and_diagram_pass() {
    let state = SessionState::new(Locale::Es, caps());
    let text = "# Tareas\n\n```mermaid\nclassDiagram\n  Tarea --> Usuario\n```\n";
    let (state, effects) = apply(
        state,
        vec![
            Msg::InstructionChanged("Tareas".into()),
            Msg::GenerateClicked,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Text(text.into()),
            },
        ],
    );
    let Some(Effect::RenderDiagrams { seq, .. }) = effects.last() else {
        panic!("expected a diagram pass, got {effects:?}");
    };
    let (state, _) = update(
        state,
        Msg::DiagramsRendered {
            seq: *seq,
            html: "<h1>Tareas</h1>\n<div class=\"mermaid\" data-processed=\"true\"><svg/></div>\n"
                .into(),
        },
    );
    let DocumentArea::Rendered(doc) = state.document() else {
        panic!("expected rendered document");
    };
    assert_eq!(doc.markdown, text);
    assert!(doc.html.contains("<svg/>"));
    assert_eq!(doc.diagram_count, 1);
}

#[test]
fn late_completion_of_old_generation_is_dropped() {
    let state = SessionState::new(Locale::Es, caps());
    let (state, _) = apply(
        state,
        vec![
            Msg::InstructionChanged("x".into()),
            Msg::GenerateClicked,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Text("first".into()),
            },
            Msg::GenerateClicked,
            Msg::GenerationCompleted {
                seq: 1,
                outcome: GenerationOutcome::Text("stale".into()),
            },
        ],
    );
    assert!(state.is_generating());
    assert!(state.document().is_empty());
}

#[test]
fn download_disabled_until_document_exists() {
    let state = SessionState::new(Locale::Es, caps());
    assert!(!state.can_download());
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());
    assert!(!state.is_exporting());
}

#[test]
fn view_reflects_predicates() {
    let state = SessionState::new(Locale::En, caps());
    let (state, _) = update(state, Msg::InstructionChanged("Library".into()));
    let view = state.view();
    assert!(view.can_generate);
    assert!(!view.can_download);
    assert_eq!(view.placeholder, "Your document will appear here.");
}
