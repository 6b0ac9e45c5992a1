//! Effect runner around the pure session state machine.
//!
//! [`Controller::dispatch`] applies a message, runs the returned effects one
//! after another and feeds each completion message back into [`update`] until
//! nothing is left to do. Effects run sequentially; the enable predicates keep
//! at most one generation and one export in flight.

use crate::capabilities::Capabilities;
use crate::config::GeneratorConfig;
use crate::error::DocGenError;
use crate::observer::{NoopObserver, Observer};
use crate::pipeline::diagram::render_diagrams;
use crate::pipeline::export::export_pdf;
use crate::pipeline::generate::{GenerationClient, Generator};
use crate::pipeline::ingest::load_context;
use crate::session::{update, Effect, GenerationOutcome, Msg, SessionState};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Owns the session state and the backends its effects need.
pub struct Controller {
    state: SessionState,
    capabilities: Capabilities,
    generator: Arc<dyn Generator>,
    config: GeneratorConfig,
    observer: Observer,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Controller {
    pub fn new(
        config: GeneratorConfig,
        capabilities: Capabilities,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let state = SessionState::new(config.locale, capabilities.flags());
        Self {
            state,
            capabilities,
            generator,
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Controller with the HTTP generation client and the configured capabilities.
    pub fn from_config(config: GeneratorConfig) -> Result<Self, DocGenError> {
        let generator = Arc::new(GenerationClient::new(&config)?);
        let capabilities = Capabilities::from_config(&config);
        Ok(Self::new(config, capabilities, generator))
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Apply `msg` and run every resulting effect to completion.
    pub async fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let (state, effects) = update(std::mem::take(&mut self.state), msg);
            self.state = state;
            self.observer.on_state_changed(&self.state);
            for effect in effects {
                self.observer.on_effect_started(&effect);
                let done = self.run_effect(&effect).await;
                self.observer.on_effect_finished(&effect);
                queue.push_back(done);
            }
        }
    }

    async fn run_effect(&self, effect: &Effect) -> Msg {
        match effect {
            Effect::LoadContext {
                upload,
                handle,
                kind,
            } => {
                let context = load_context(
                    handle,
                    *kind,
                    self.capabilities.text_extractor.as_deref(),
                    self.state.messages(),
                )
                .await;
                Msg::ContextLoaded {
                    upload: *upload,
                    context,
                }
            }
            Effect::Generate { seq, prompt } => {
                let outcome = match self.generator.generate(prompt).await {
                    Ok(Some(text)) => GenerationOutcome::Text(text),
                    Ok(None) => {
                        info!("Response carried no candidate text");
                        GenerationOutcome::Empty
                    }
                    Err(e) => {
                        error!("Error generating document: {}", e);
                        GenerationOutcome::Failed(e.to_string())
                    }
                };
                Msg::GenerationCompleted { seq: *seq, outcome }
            }
            Effect::RenderDiagrams { seq, html } => {
                let html = match self.capabilities.diagram_renderer.as_deref() {
                    Some(renderer) => render_diagrams(renderer, html).await.html,
                    None => html.clone(),
                };
                Msg::DiagramsRendered { seq: *seq, html }
            }
            Effect::ExportPdf { html } => {
                let result = export_pdf(
                    Some(html.as_str()),
                    self.capabilities.rasterizer.as_deref(),
                    &self.config.export,
                    &self.config.output_dir,
                )
                .await;
                match result {
                    Ok(pdf) => {
                        debug!("Export finished: {:?}", pdf);
                        Msg::ExportFinished(Ok(pdf))
                    }
                    Err(e) => {
                        error!("Error exporting PDF: {}", e);
                        Msg::ExportFinished(Err(e.to_string()))
                    }
                }
            }
        }
    }
}
