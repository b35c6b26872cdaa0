use std::collections::HashMap;
use std::sync::Arc;
use lazy_static::lazy_static;
use regex::Regex;
use crate::error::HookError;
use crate::hook::{HookHandler, HookKind};

lazy_static! {
    static ref HANDLER_REFERENCE: Regex =
        Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").unwrap();
}

/// Scope prefixes that refer to the registry itself.
const GLOBAL_PREFIXES: [&str; 2] = ["window.", "globalThis."];

/// Named hook handlers, built by the host before the dispatcher and never
/// mutated by it.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn HookHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: impl HookHandler + 'static) -> &mut Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn with(mut self, name: impl Into<String>, handler: impl HookHandler + 'static) -> Self {
        self.register(name, handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Looks up a dotted reference such as `App.handlers.onDone`.
    pub fn resolve(&self, hook: HookKind, reference: &str) -> Result<Arc<dyn HookHandler>, HookError> {
        let reference = reference.trim();
        if !HANDLER_REFERENCE.is_match(reference) {
            return Err(HookError::NotAReference {
                hook: hook.to_string(),
                reference: reference.to_string(),
            });
        }

        let name = GLOBAL_PREFIXES
            .iter()
            .find_map(|prefix| reference.strip_prefix(prefix))
            .filter(|name| self.handlers.contains_key(*name))
            .unwrap_or(reference);

        self.handlers.get(name).cloned().ok_or_else(|| HookError::Unresolved {
            hook: hook.to_string(),
            reference: reference.to_string(),
        })
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &names).finish()
    }
}
