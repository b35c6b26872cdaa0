//! Shared fixtures: a memory document, a recording handler per hook and a
//! dispatcher wired to a scripted transport.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use afetch_core::hook::{HandlerRegistry, HandlerResult, HookEvent, HookKind};
use afetch_core::memory::{MemoryDocument, MemoryElement, RecordingScriptHost, ScriptedTransport};
use afetch_core::{Dispatcher, DispatcherBuilder};
use url::Url;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn document() -> Arc<MemoryDocument> {
    Arc::new(MemoryDocument::new(Url::parse("http://localhost:8080/").unwrap()))
}

pub fn handler_name(hook: HookKind) -> String {
    format!("trace.{}", hook.attribute().trim_start_matches("fetch-"))
}

/// Binds every hook attribute of `element` to its recording handler.
pub fn with_all_hooks(mut element: MemoryElement) -> MemoryElement {
    for hook in HookKind::ALL {
        element = element.with_attribute(hook.attribute(), &handler_name(hook));
    }
    element
}

#[derive(Clone, Default)]
pub struct HookLog {
    calls: Arc<Mutex<Vec<(HookKind, HookEvent)>>>,
}

impl HookLog {
    pub fn registry(&self) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        for hook in HookKind::ALL {
            let calls = self.calls.clone();
            registry.register(handler_name(hook), move |event: &HookEvent| -> HandlerResult {
                calls.lock().unwrap().push((hook, event.clone()));
                Ok(())
            });
        }
        registry
    }

    pub fn kinds(&self) -> Vec<HookKind> {
        self.calls.lock().unwrap().iter().map(|(hook, _)| *hook).collect()
    }

    pub fn count(&self, hook: HookKind) -> usize {
        self.kinds().into_iter().filter(|kind| *kind == hook).count()
    }

    pub fn event(&self, hook: HookKind) -> Option<HookEvent> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(kind, _)| *kind == hook)
            .map(|(_, event)| event.clone())
    }
}

pub struct Harness {
    pub document: Arc<MemoryDocument>,
    pub transport: Arc<ScriptedTransport>,
    pub scripts: Arc<RecordingScriptHost>,
    pub hooks: HookLog,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self::with(transport, |builder| builder)
    }

    pub fn with(transport: ScriptedTransport, configure: impl FnOnce(DispatcherBuilder) -> DispatcherBuilder) -> Self {
        init_logging();
        let document = document();
        let transport = Arc::new(transport);
        let scripts = Arc::new(RecordingScriptHost::new());
        let hooks = HookLog::default();

        let builder = Dispatcher::builder(document.clone(), transport.clone())
            .handlers(hooks.registry())
            .script_host(scripts.clone());
        let dispatcher = configure(builder).build().unwrap();

        Self {
            document,
            transport,
            scripts,
            hooks,
            dispatcher,
        }
    }

    pub fn target(&self) -> Arc<MemoryElement> {
        self.document.append(MemoryElement::new("div").with_attribute("id", "out"))
    }
}
