pub mod attribute;
pub mod body;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod hook;
pub mod interceptor;
pub mod memory;
pub mod registration;
pub mod render;
pub mod script;
pub mod surface;
pub mod transport;
pub mod types;

pub use config::DispatcherConfig;
pub use dispatcher::{ActivationOutcome, ActivationReport, ActivationState, Dispatcher, DispatcherBuilder};
pub use error::{ActivationError, AfetchError, AfetchResult};
pub use hook::{HandlerRegistry, HandlerResult, HookDetail, HookEvent, HookKind};
pub use registration::Registrar;
pub use surface::{Document, Element, ElementRef, UiEvent};
pub use transport::{CancellationToken, Transport, TransportResponse};
