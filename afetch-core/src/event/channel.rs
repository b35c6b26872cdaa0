use std::collections::HashMap;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;
use crate::dispatcher::state::ActivationState;
use crate::hook::HookKind;

/// Channel carrying lifecycle events out of the dispatcher
#[derive(Debug, Clone)]
pub struct ActivationEventChannel {
    sender: mpsc::UnboundedSender<DispatchEvent>,
}

impl ActivationEventChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// A dropped receiver is not an error for the emitter.
    pub fn emit(&self, event: DispatchEvent) {
        if self.sender.send(event).is_err() {
            log::trace!("dispatch event dropped, no observer");
        }
    }

    pub fn emit_with_context(
        &self,
        activation_id: Option<Uuid>,
        kind: DispatchEventKind,
        metadata: HashMap<String, String>,
    ) {
        self.emit(DispatchEvent {
            id: Uuid::new_v4(),
            activation_id,
            timestamp: Utc::now(),
            kind,
            metadata,
        });
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[derive(Debug, Clone)]
pub struct DispatchEvent {
    pub id: Uuid,
    /// `None` for events outside an activation (registration)
    pub activation_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub kind: DispatchEventKind,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEventKind {
    StateChanged {
        from: ActivationState,
        to: ActivationState,
    },
    HookInvoked {
        hook: HookKind,
        reference: String,
        success: bool,
    },
    InterceptorTriggered {
        interceptor_name: String,
        priority: i32,
    },
    ScriptExecuted {
        success: bool,
    },
    Diagnostic {
        message: String,
    },
    ElementRegistered {
        tag: String,
    },
}

impl DispatchEvent {
    pub fn is_error(&self) -> bool {
        match &self.kind {
            DispatchEventKind::StateChanged { to, .. } => to.is_failure(),
            DispatchEventKind::HookInvoked { success, .. } => !success,
            DispatchEventKind::ScriptExecuted { success } => !success,
            _ => false,
        }
    }
}

/// Selects events of interest from a recorded stream.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub activation_ids: Option<Vec<Uuid>>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub only_errors: bool,
}

impl EventFilter {
    pub fn matches(&self, event: &DispatchEvent) -> bool {
        if let Some(ref ids) = self.activation_ids {
            match event.activation_id {
                Some(id) if ids.contains(&id) => {}
                _ => return false,
            }
        }

        if let Some((start, end)) = self.time_range {
            if event.timestamp < start || event.timestamp > end {
                return false;
            }
        }

        if self.only_errors && !event.is_error() {
            return false;
        }

        true
    }
}
