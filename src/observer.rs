//! Observer callbacks for session events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::controller::Controller::with_observer`] to follow the session as
//! effects start and state changes. The CLI uses it to drive its spinner.
//!
//! # Example
//!
//! ```rust
//! use domain_docgen::{Effect, SessionObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     started: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_effect_started(&self, effect: &Effect) {
//!         self.started.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}...", effect.label());
//!     }
//! }
//! ```

use crate::session::{Effect, SessionState};
use std::sync::Arc;

/// Called by the controller while it processes messages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SessionObserver: Send + Sync {
    /// Called after every applied message.
    fn on_state_changed(&self, state: &SessionState) {
        let _ = state;
    }

    /// Called just before an effect runs.
    fn on_effect_started(&self, effect: &Effect) {
        let _ = effect;
    }

    /// Called when an effect has produced its completion message.
    fn on_effect_finished(&self, effect: &Effect) {
        let _ = effect;
    }
}

/// Observer that ignores every event. This is the controller's default.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Shared observer handle as stored by the controller.
pub type Observer = Arc<dyn SessionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        states: AtomicUsize,
        started: AtomicUsize,
    }

    impl SessionObserver for Tracking {
        fn on_state_changed(&self, _state: &SessionState) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }

        fn on_effect_started(&self, _effect: &Effect) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_accepts_everything() {
        let obs: Observer = Arc::new(NoopObserver);
        obs.on_state_changed(&SessionState::default());
        let effect = Effect::ExportPdf { html: "x".into() };
        obs.on_effect_started(&effect);
        obs.on_effect_finished(&effect);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let t = Tracking::default();
        t.on_state_changed(&SessionState::default());
        t.on_effect_started(&Effect::ExportPdf { html: "x".into() });
        t.on_effect_finished(&Effect::ExportPdf { html: "x".into() });
        assert_eq!(t.states.load(Ordering::SeqCst), 1);
        assert_eq!(t.started.load(Ordering::SeqCst), 1);
    }
}
