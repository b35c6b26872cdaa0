use http::header::{CACHE_CONTROL, REFERER};
use http::{HeaderMap, HeaderValue};
use log::debug;
use url::Url;
use afetch_core::types::FetchOptions;

/// Redirect handling requested with `fetch-redirect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectMode {
    #[default]
    Follow,
    /// The redirect response itself is returned
    Manual,
    /// Any redirect fails the exchange
    Error,
}

impl RedirectMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("manual") => Self::Manual,
            Some("error") => Self::Error,
            _ => Self::Follow,
        }
    }
}

/// Writes the header side of the pass-through options into `headers`.
/// Headers the element declared explicitly always win.
pub(crate) fn apply(options: &FetchOptions, url: &Url, headers: &mut HeaderMap) {
    if let Some(referrer) = referrer(options, url) {
        if !headers.contains_key(REFERER) {
            if let Ok(value) = HeaderValue::from_str(referrer.as_str()) {
                headers.insert(REFERER, value);
            }
        }
    }

    if let Some(directive) = options.cache.as_deref().and_then(cache_directive) {
        if !headers.contains_key(CACHE_CONTROL) {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(directive));
        }
    }

    if options.mode.is_some() || options.credentials.is_some() {
        debug!(
            "mode {:?} and credentials {:?} have no effect outside a browser",
            options.mode, options.credentials
        );
    }
}

/// Referrer to announce, resolved against the request url.
fn referrer(options: &FetchOptions, url: &Url) -> Option<Url> {
    let declared = options.referrer.as_deref().map(str::trim).filter(|value| !value.is_empty())?;
    if declared == "about:client" {
        return None;
    }
    if options
        .referrer_policy
        .as_deref()
        .is_some_and(|policy| policy.trim().eq_ignore_ascii_case("no-referrer"))
    {
        return None;
    }
    let mut resolved = url.join(declared).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

fn cache_directive(cache: &str) -> Option<&'static str> {
    match cache.trim().to_ascii_lowercase().as_str() {
        "no-store" => Some("no-store"),
        "no-cache" | "reload" => Some("no-cache"),
        _ => None,
    }
}
