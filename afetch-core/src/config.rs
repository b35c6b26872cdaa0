use serde::Deserialize;
use smart_default::SmartDefault;
use crate::error::AfetchResult;

/// Dispatcher and registrar settings shared by every activation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Method used when `fetch-method` is absent
    #[default = "GET"]
    pub default_method: String,
    /// Text rendered into the target for binary responses
    #[default = "[blob received]"]
    pub binary_placeholder: String,
    /// Default of `fetch-execjs`
    #[default = true]
    pub execute_scripts: bool,
    /// Attribute marking elements already upgraded
    #[default = "data-afetch"]
    pub marker_attribute: String,
    pub disable_auto_observe: bool,
    /// Give registered anchors button semantics (role, tabindex, href)
    #[default = true]
    pub upgrade_anchors: bool,
}

impl DispatcherConfig {
    pub fn from_json(text: &str) -> AfetchResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
