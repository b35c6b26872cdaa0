use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use http::Method;
use log::error;
use url::Url;
use uuid::Uuid;
use crate::error::{ActivationError, BodyBuildError, HookError, ParseError};
use crate::surface::{Element, ElementRef};
use crate::transport::TransportResponse;
use crate::types::{ActivationRequest, ParsedResponse, ResponseKind};

pub mod registry;

pub use registry::HandlerRegistry;

/// Lifecycle phase a hook attribute is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Before,
    Start,
    Response,
    Json,
    Text,
    Blob,
    Script,
    Failure,
    Timeout,
    ParseError,
    BodyBuildError,
    Error,
    Complete,
}

impl HookKind {
    pub const ALL: [HookKind; 13] = [
        HookKind::Before,
        HookKind::Start,
        HookKind::Response,
        HookKind::Json,
        HookKind::Text,
        HookKind::Blob,
        HookKind::Script,
        HookKind::Failure,
        HookKind::Timeout,
        HookKind::ParseError,
        HookKind::BodyBuildError,
        HookKind::Error,
        HookKind::Complete,
    ];

    pub fn attribute(self) -> &'static str {
        match self {
            HookKind::Before => "fetch-onbefore",
            HookKind::Start => "fetch-onstart",
            HookKind::Response => "fetch-onresponse",
            HookKind::Json => "fetch-onjson",
            HookKind::Text => "fetch-ontext",
            HookKind::Blob => "fetch-onblob",
            HookKind::Script => "fetch-onjs",
            HookKind::Failure => "fetch-onfailure",
            HookKind::Timeout => "fetch-ontimeout",
            HookKind::ParseError => "fetch-onparsingerror",
            HookKind::BodyBuildError => "fetch-onfetchbodyerror",
            HookKind::Error => "fetch-onerror",
            HookKind::Complete => "fetch-oncomplete",
        }
    }

    /// Success hook for a decoded kind.
    pub fn for_kind(kind: ResponseKind) -> Self {
        match kind {
            ResponseKind::Structured => HookKind::Json,
            ResponseKind::Text => HookKind::Text,
            ResponseKind::Binary => HookKind::Blob,
            ResponseKind::Script => HookKind::Script,
        }
    }
}

/// Shown as the attribute name.
impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Phase specific part of a hook event.
#[derive(Debug, Clone)]
pub enum HookDetail {
    Before,
    Start { request: ActivationRequest },
    Response { response: Arc<TransportResponse> },
    Data { parsed: ParsedResponse, response: Arc<TransportResponse> },
    Failure { error: ActivationError },
    Timeout { timeout_ms: u64 },
    ParseError { error: ParseError, response: Arc<TransportResponse> },
    BodyBuildError { error: BodyBuildError },
    Error { error: ActivationError },
    Complete,
}

#[derive(Debug, Clone)]
pub struct HookEvent {
    pub activation_id: Uuid,
    pub element: ElementRef,
    pub url: Option<Url>,
    pub method: Option<Method>,
    pub detail: HookDetail,
}

impl HookEvent {
    pub fn parsed(&self) -> Option<&ParsedResponse> {
        match &self.detail {
            HookDetail::Data { parsed, .. } => Some(parsed),
            HookDetail::Failure { error: ActivationError::Rejected { response, .. } } => Some(response),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ActivationError> {
        match &self.detail {
            HookDetail::Failure { error } | HookDetail::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Raw body text of a parse failure.
    pub fn raw(&self) -> Option<&str> {
        match &self.detail {
            HookDetail::ParseError { error, .. } => Some(&error.raw),
            HookDetail::Error { error: ActivationError::Parse(error) } => Some(&error.raw),
            _ => None,
        }
    }
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Host supplied callback bound by name in a [`HandlerRegistry`].
pub trait HookHandler: Send + Sync {
    fn handle(&self, event: &HookEvent) -> HandlerResult;
}

impl<F> HookHandler for F
where
    F: Fn(&HookEvent) -> HandlerResult + Send + Sync,
{
    fn handle(&self, event: &HookEvent) -> HandlerResult {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// The element declares no handler for this hook
    Absent,
    Invoked { reference: String },
    Failed { reference: String, error: HookError },
}

/// Resolves hook attributes against the registry and runs handlers in
/// isolation: nothing a handler does can abort an activation.
pub struct HookInvoker {
    registry: Arc<HandlerRegistry>,
}

impl HookInvoker {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Handler reference the element declares for `hook`.
    pub fn reference(element: &dyn Element, hook: HookKind) -> Option<String> {
        element
            .attribute(hook.attribute())
            .map(|reference| reference.trim().to_string())
            .filter(|reference| !reference.is_empty())
    }

    pub fn fire(&self, element: &dyn Element, hook: HookKind, event: &HookEvent) -> HookOutcome {
        match Self::reference(element, hook) {
            Some(reference) => self.invoke(hook, reference, event),
            None => HookOutcome::Absent,
        }
    }

    pub(crate) fn invoke(&self, hook: HookKind, reference: String, event: &HookEvent) -> HookOutcome {
        let result = self.registry.resolve(hook, &reference).and_then(|handler| {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(failure)) => Err(HookError::Failed {
                    hook: hook.to_string(),
                    reference: reference.clone(),
                    message: failure.to_string(),
                }),
                Err(payload) => Err(HookError::Panicked {
                    hook: hook.to_string(),
                    reference: reference.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            }
        });

        match result {
            Ok(()) => HookOutcome::Invoked { reference },
            Err(error) => {
                error!("{error}");
                HookOutcome::Failed { reference, error }
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
