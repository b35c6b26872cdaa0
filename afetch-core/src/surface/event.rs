use std::sync::atomic::{AtomicBool, Ordering};
use crate::surface::ElementRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEventKind {
    Click,
    KeyDown { key: String },
}

/// A user interaction delivered by the host.
#[derive(Debug)]
pub struct UiEvent {
    pub target: ElementRef,
    pub kind: UiEventKind,
    default_prevented: AtomicBool,
}

impl UiEvent {
    pub fn new(target: ElementRef, kind: UiEventKind) -> Self {
        Self {
            target,
            kind,
            default_prevented: AtomicBool::new(false),
        }
    }

    pub fn click(target: ElementRef) -> Self {
        Self::new(target, UiEventKind::Click)
    }

    pub fn key_down(target: ElementRef, key: impl Into<String>) -> Self {
        Self::new(target, UiEventKind::KeyDown { key: key.into() })
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Relaxed);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Relaxed)
    }

    /// Click, Enter and Space all activate.
    pub fn is_activation(&self) -> bool {
        match &self.kind {
            UiEventKind::Click => true,
            UiEventKind::KeyDown { key } => key == "Enter" || key == " ",
        }
    }
}
