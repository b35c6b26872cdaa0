use std::sync::Arc;
use std::time::Duration;
use http::StatusCode;
use thiserror::Error;
use crate::types::ParsedResponse;

/// Failure while turning the declared attributes of an element into a request.
///
/// Fatal for the activation that raised it: the request is never sent.
#[derive(Debug, Clone, Error)]
pub enum BodyBuildError {
    #[error("fetch-body is not valid JSON: {source}")]
    InvalidBody {
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("fetch-headers is not valid JSON: {source}")]
    InvalidHeaders {
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("fetch-headers must be a JSON object")]
    HeadersNotAnObject,

    #[error("invalid header '{name}': {message}")]
    InvalidHeader {
        name: String,
        message: String,
    },

    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl BodyBuildError {
    pub fn invalid_body(error: serde_json::Error) -> Self {
        Self::InvalidBody { source: Arc::new(error) }
    }

    pub fn invalid_headers(error: serde_json::Error) -> Self {
        Self::InvalidHeaders { source: Arc::new(error) }
    }

    pub fn invalid_header(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// The response body did not decode as the kind it was classified as.
#[derive(Debug, Clone, Error)]
#[error("response body could not be decoded: {source}")]
pub struct ParseError {
    /// Body recovered as text, for diagnostics and rendering
    pub raw: String,
    #[source]
    pub source: Arc<serde_json::Error>,
}

impl ParseError {
    pub fn new(raw: impl Into<String>, source: serde_json::Error) -> Self {
        Self {
            raw: raw.into(),
            source: Arc::new(source),
        }
    }
}

/// Network level failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request could not be sent: {message}")]
    InvalidRequest { message: String },

    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }
}

/// The activation deadline elapsed before the transport resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request timed out after {timeout_ms}ms")]
pub struct TimeoutError {
    pub timeout_ms: u64,
}

impl TimeoutError {
    pub fn new(deadline: Duration) -> Self {
        Self {
            timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A hook could not be resolved or its handler failed. Always swallowed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HookError {
    #[error("{hook}: '{reference}' is not a handler reference")]
    NotAReference { hook: String, reference: String },

    #[error("{hook}: no handler registered as '{reference}'")]
    Unresolved { hook: String, reference: String },

    #[error("{hook}: handler '{reference}' failed: {message}")]
    Failed { hook: String, reference: String, message: String },

    #[error("{hook}: handler '{reference}' panicked: {message}")]
    Panicked { hook: String, reference: String, message: String },
}

/// Failure of the script capability while executing response content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("script execution failed: {0}")]
    Failed(String),

    #[error("no script host configured")]
    Unavailable,
}

/// Outcome of the exchange chain when no response came back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

/// Every error an activation can report through its hooks.
#[derive(Debug, Clone, Error)]
pub enum ActivationError {
    #[error(transparent)]
    BodyBuild(#[from] BodyBuildError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The server answered with a non-success status
    #[error("request failed with status {status}")]
    Rejected {
        status: StatusCode,
        response: ParsedResponse,
    },
}

impl From<ExchangeError> for ActivationError {
    fn from(error: ExchangeError) -> Self {
        match error {
            ExchangeError::Transport(error) => Self::Transport(error),
            ExchangeError::Timeout(error) => Self::Timeout(error),
        }
    }
}

impl ActivationError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::BodyBuild(_) => ErrorSeverity::Error,
            Self::Parse(_) => ErrorSeverity::Error,
            Self::Transport(TransportError::Cancelled) => ErrorSeverity::Warning,
            Self::Transport(_) => ErrorSeverity::Error,
            Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Rejected { .. } => ErrorSeverity::Warning,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Error,
    Warning,
}

impl ErrorSeverity {
    pub fn level(self) -> log::Level {
        match self {
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Warning => log::Level::Warn,
        }
    }
}

/// Errors raised while setting up a dispatcher, never during an activation.
#[derive(Debug, Error)]
pub enum AfetchError {
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("interceptor '{name}' priority {priority} is not in a valid range")]
    InterceptorPriority { name: String, priority: i32 },

    #[error("interceptor '{0}' is already registered")]
    DuplicateInterceptor(String),
}

pub type AfetchResult<T> = Result<T, AfetchError>;
