use lazy_static::lazy_static;
use regex::Regex;
use crate::config::DispatcherConfig;
use crate::surface::Element;
use crate::types::{FetchOptions, Placement, RenderDirective, RenderFormat, ResponsePreference};

pub mod names {
    pub const URL: &str = "fetch";
    pub const METHOD: &str = "fetch-method";
    pub const MODE: &str = "fetch-mode";
    pub const CREDENTIALS: &str = "fetch-credentials";
    pub const CACHE: &str = "fetch-cache";
    pub const REDIRECT: &str = "fetch-redirect";
    pub const REFERRER: &str = "fetch-referrer";
    pub const REFERRER_POLICY: &str = "fetch-referrer-policy";
    pub const RESPONSE: &str = "fetch-response";
    pub const TARGET: &str = "fetch-target";
    pub const TARGET_FORMAT: &str = "fetch-target-format";
    pub const TARGET_MODE: &str = "fetch-target-mode";
    pub const TIMEOUT: &str = "fetch-timeout";
    pub const EXECJS: &str = "fetch-execjs";
    pub const SPINNER: &str = "fetch-spinner";
    pub const DISABLING: &str = "fetch-disabling";
    pub const FORMS: &str = "fetch-forms";
    pub const BODY: &str = "fetch-body";
    pub const HEADERS: &str = "fetch-headers";
    pub const ARIA_DISABLED: &str = "aria-disabled";
}

lazy_static! {
    static ref LEADING_INTEGER: Regex = Regex::new(r"^\s*([+-]?\d+)").unwrap();
}

const TRUE_TOKENS: [&str; 5] = ["true", "1", "yes", "y", "on"];
const FALSE_TOKENS: [&str; 5] = ["false", "0", "no", "n", "off"];

/// Raw attribute value.
pub fn string(element: &dyn Element, name: &str) -> Option<String> {
    element.attribute(name)
}

/// Attribute value, or `default` when absent or empty.
pub fn string_or(element: &dyn Element, name: &str, default: &str) -> String {
    non_empty(element, name).unwrap_or_else(|| default.to_string())
}

/// Attribute value, `None` when absent or empty.
pub fn non_empty(element: &dyn Element, name: &str) -> Option<String> {
    element.attribute(name).filter(|value| !value.is_empty())
}

pub fn boolean(element: &dyn Element, name: &str, default: bool) -> bool {
    match element.attribute(name) {
        None => default,
        Some(value) => parse_boolean(&value, default),
    }
}

fn parse_boolean(value: &str, default: bool) -> bool {
    let token = value.trim().to_ascii_lowercase();
    if token.is_empty() || TRUE_TOKENS.contains(&token.as_str()) {
        true
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        false
    } else {
        default
    }
}

/// Leading integer of `value`; anything unparsable or negative is zero.
pub fn milliseconds(value: &str) -> u64 {
    LEADING_INTEGER
        .captures(value)
        .and_then(|captures| captures[1].parse::<i64>().ok())
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(0)
}

/// Typed configuration of one element, read in a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementConfig {
    pub url: Option<String>,
    pub method: String,
    pub options: FetchOptions,
    pub response: ResponsePreference,
    pub target: Option<String>,
    pub render: RenderDirective,
    pub timeout_ms: u64,
    pub execute_scripts: bool,
    pub spinner: Option<String>,
    pub disabling: bool,
}

impl ElementConfig {
    pub fn read(element: &dyn Element, config: &DispatcherConfig) -> Self {
        Self {
            url: non_empty(element, names::URL),
            method: string_or(element, names::METHOD, &config.default_method).to_uppercase(),
            options: FetchOptions {
                mode: non_empty(element, names::MODE),
                credentials: non_empty(element, names::CREDENTIALS),
                cache: non_empty(element, names::CACHE),
                redirect: non_empty(element, names::REDIRECT),
                referrer: non_empty(element, names::REFERRER),
                referrer_policy: non_empty(element, names::REFERRER_POLICY),
            },
            response: non_empty(element, names::RESPONSE)
                .map(|value| ResponsePreference::parse(&value))
                .unwrap_or_default(),
            target: non_empty(element, names::TARGET),
            render: RenderDirective {
                format: non_empty(element, names::TARGET_FORMAT)
                    .map(|value| RenderFormat::parse(&value))
                    .unwrap_or_default(),
                placement: non_empty(element, names::TARGET_MODE)
                    .map(|value| Placement::parse(&value))
                    .unwrap_or_default(),
            },
            timeout_ms: non_empty(element, names::TIMEOUT)
                .map(|value| milliseconds(&value))
                .unwrap_or(0),
            execute_scripts: boolean(element, names::EXECJS, config.execute_scripts),
            spinner: non_empty(element, names::SPINNER),
            disabling: boolean(element, names::DISABLING, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryElement;

    #[test]
    fn boolean_tokens() {
        let element = MemoryElement::new("button")
            .with_attribute("a", "")
            .with_attribute("b", " YES ")
            .with_attribute("c", "off")
            .with_attribute("d", "maybe");

        assert!(boolean(&element, "a", false));
        assert!(boolean(&element, "b", false));
        assert!(!boolean(&element, "c", true));
        assert!(boolean(&element, "d", true));
        assert!(!boolean(&element, "d", false));
        assert!(boolean(&element, "missing", true));
    }

    #[test]
    fn milliseconds_takes_leading_integer() {
        assert_eq!(milliseconds("50"), 50);
        assert_eq!(milliseconds(" 250ms"), 250);
        assert_eq!(milliseconds("-5"), 0);
        assert_eq!(milliseconds("soon"), 0);
    }

    #[test]
    fn element_config_defaults() {
        let element = MemoryElement::new("a").with_attribute("fetch", "/x");
        let config = ElementConfig::read(&element, &DispatcherConfig::default());

        assert_eq!(config.url.as_deref(), Some("/x"));
        assert_eq!(config.method, "GET");
        assert_eq!(config.response, ResponsePreference::Auto);
        assert_eq!(config.render, RenderDirective::default());
        assert_eq!(config.timeout_ms, 0);
        assert!(config.execute_scripts);
        assert!(!config.disabling);
    }

    #[test]
    fn element_config_reads_every_attribute() {
        let element = MemoryElement::new("button")
            .with_attribute("fetch", "/api")
            .with_attribute("fetch-method", "post")
            .with_attribute("fetch-response", "text")
            .with_attribute("fetch-target", "#out")
            .with_attribute("fetch-target-format", "text")
            .with_attribute("fetch-target-mode", "-1")
            .with_attribute("fetch-timeout", "50")
            .with_attribute("fetch-execjs", "false")
            .with_attribute("fetch-spinner", ".spin")
            .with_attribute("fetch-disabling", "")
            .with_attribute("fetch-redirect", "manual")
            .with_attribute("fetch-referrer", "https://ref.example/");
        let config = ElementConfig::read(&element, &DispatcherConfig::default());

        assert_eq!(config.method, "POST");
        assert_eq!(config.response, ResponsePreference::Text);
        assert_eq!(config.target.as_deref(), Some("#out"));
        assert_eq!(config.render.format, RenderFormat::PlainText);
        assert_eq!(config.render.placement, Placement::Prepend);
        assert_eq!(config.timeout_ms, 50);
        assert!(!config.execute_scripts);
        assert_eq!(config.spinner.as_deref(), Some(".spin"));
        assert!(config.disabling);
        assert_eq!(config.options.redirect.as_deref(), Some("manual"));
        assert_eq!(config.options.referrer.as_deref(), Some("https://ref.example/"));
    }

    #[test]
    fn empty_url_counts_as_absent() {
        let element = MemoryElement::new("a").with_attribute("fetch", "");
        assert!(ElementConfig::read(&element, &DispatcherConfig::default()).url.is_none());
    }
}
