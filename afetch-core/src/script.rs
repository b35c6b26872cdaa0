use crate::error::ScriptError;
use crate::surface::ElementRef;

/// The one capability allowed to execute response content as code.
pub trait ScriptHost: Send + Sync {
    fn execute(&self, source: &str, element: &ElementRef) -> Result<(), ScriptError>;
}
