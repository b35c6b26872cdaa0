pub mod channel;

pub use channel::{ActivationEventChannel, DispatchEvent, DispatchEventKind, EventFilter};
