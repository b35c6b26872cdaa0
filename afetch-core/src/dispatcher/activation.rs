use std::collections::HashMap;
use http::Method;
use log::{debug, warn};
use url::Url;
use uuid::Uuid;
use crate::attribute::{names, ElementConfig};
use crate::dispatcher::state::{ActivationOutcome, ActivationReport, ActivationState};
use crate::dispatcher::Dispatcher;
use crate::event::DispatchEventKind;
use crate::hook::{HookDetail, HookEvent, HookInvoker, HookKind, HookOutcome};
use crate::surface::ElementRef;
use crate::types::ActivationRequest;

/// Busy state applied for the exchange and what it replaced.
#[derive(Debug)]
struct Affordances {
    spinner: Option<String>,
    disabling: bool,
    prior_disabled: bool,
    /// Value present before the exchange, restored as is
    prior_aria_disabled: Option<String>,
}

/// Per-activation context. Dropping it before `complete` still runs the
/// completion phase, so a cancelled activation future cleans up too.
pub(crate) struct Activation<'a> {
    dispatcher: &'a Dispatcher,
    pub id: Uuid,
    pub element: ElementRef,
    pub url: Option<Url>,
    pub method: Option<Method>,
    pub request: Option<ActivationRequest>,
    state: ActivationState,
    trace: Vec<ActivationState>,
    diagnostics: Vec<String>,
    affordances: Option<Affordances>,
    completed: bool,
}

impl<'a> Activation<'a> {
    pub fn new(dispatcher: &'a Dispatcher, element: ElementRef) -> Self {
        Self {
            dispatcher,
            id: Uuid::new_v4(),
            element,
            url: None,
            method: None,
            request: None,
            state: ActivationState::Idle,
            trace: vec![ActivationState::Idle],
            diagnostics: Vec::new(),
            affordances: None,
            completed: false,
        }
    }

    pub fn transition(&mut self, next: ActivationState) {
        if !self.state.can_transition_to(next) {
            warn!("activation {}: unexpected transition {} -> {}", self.id, self.state, next);
        }
        debug!("activation {}: {} -> {}", self.id, self.state, next);
        let from = std::mem::replace(&mut self.state, next);
        self.trace.push(next);
        self.emit(DispatchEventKind::StateChanged { from, to: next });
    }

    /// Builds the event only when the element declares the hook.
    pub fn fire(&self, hook: HookKind, detail: impl FnOnce() -> HookDetail) -> HookOutcome {
        let Some(reference) = HookInvoker::reference(self.element.as_ref(), hook) else {
            return HookOutcome::Absent;
        };
        let event = HookEvent {
            activation_id: self.id,
            element: self.element.clone(),
            url: self.url.clone(),
            method: self.method.clone(),
            detail: detail(),
        };
        let outcome = self.dispatcher.hooks.invoke(hook, reference.clone(), &event);
        self.emit(DispatchEventKind::HookInvoked {
            hook,
            reference,
            success: matches!(outcome, HookOutcome::Invoked { .. }),
        });
        outcome
    }

    pub fn emit(&self, kind: DispatchEventKind) {
        if let Some(channel) = &self.dispatcher.events {
            let mut metadata = HashMap::new();
            if let Some(url) = &self.url {
                metadata.insert("url".to_string(), url.to_string());
            }
            channel.emit_with_context(Some(self.id), kind, metadata);
        }
    }

    pub fn diagnostic(&mut self, message: String) {
        self.emit(DispatchEventKind::Diagnostic { message: message.clone() });
        self.diagnostics.push(message);
    }

    pub fn engage(&mut self, config: &ElementConfig) {
        let element = &self.element;
        if let Some(selector) = &config.spinner {
            for spinner in self.dispatcher.document.query_selector_all(selector) {
                spinner.set_displayed(true);
            }
        }

        let prior_disabled = element.is_disabled();
        if config.disabling {
            element.set_disabled(true);
        }

        let prior_aria_disabled = element.attribute(names::ARIA_DISABLED);
        element.set_attribute(names::ARIA_DISABLED, "true");

        self.affordances = Some(Affordances {
            spinner: config.spinner.clone(),
            disabling: config.disabling,
            prior_disabled,
            prior_aria_disabled,
        });
    }

    fn release(&mut self) {
        let Some(affordances) = self.affordances.take() else {
            return;
        };
        match &affordances.prior_aria_disabled {
            Some(value) => self.element.set_attribute(names::ARIA_DISABLED, value),
            None => self.element.remove_attribute(names::ARIA_DISABLED),
        }
        if let Some(selector) = &affordances.spinner {
            for spinner in self.dispatcher.document.query_selector_all(selector) {
                spinner.set_displayed(false);
            }
        }
        if affordances.disabling && !affordances.prior_disabled {
            self.element.set_disabled(false);
        }
    }

    fn finish(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.release();
        self.transition(ActivationState::Complete);
        self.fire(HookKind::Complete, || HookDetail::Complete);
    }

    fn report(&mut self, outcome: ActivationOutcome) -> ActivationReport {
        ActivationReport {
            activation_id: self.id,
            outcome,
            trace: std::mem::take(&mut self.trace),
            request: self.request.take(),
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    /// Ends an activation that never left `Idle`.
    pub fn skip(mut self) -> ActivationReport {
        self.completed = true;
        self.report(ActivationOutcome::Skipped)
    }

    pub fn complete(mut self, outcome: ActivationOutcome) -> ActivationReport {
        self.finish();
        self.report(outcome)
    }
}

impl Drop for Activation<'_> {
    fn drop(&mut self) {
        if !self.completed {
            warn!("activation {} dropped in state {}, completing", self.id, self.state);
            self.finish();
        }
    }
}
