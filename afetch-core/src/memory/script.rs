use std::sync::{Mutex, PoisonError};
use crate::error::ScriptError;
use crate::script::ScriptHost;
use crate::surface::ElementRef;

/// Records executed sources instead of running them.
#[derive(Debug, Default)]
pub struct RecordingScriptHost {
    executed: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl RecordingScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ScriptHost for RecordingScriptHost {
    fn execute(&self, source: &str, _element: &ElementRef) -> Result<(), ScriptError> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(source.to_string());
        match &self.fail_with {
            Some(message) => Err(ScriptError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}
