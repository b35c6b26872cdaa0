use std::borrow::Cow;
use std::time::Duration;
use derive_more::Display;
use http::{HeaderMap, Method};
use serde_json::Value;
use url::Url;

/// Decoding preference declared with `fetch-response`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ResponsePreference {
    #[default]
    #[display("auto")]
    Auto,
    #[display("json")]
    Structured,
    #[display("text")]
    Text,
    #[display("blob")]
    Binary,
}

impl ResponsePreference {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Structured,
            "text" => Self::Text,
            "blob" => Self::Binary,
            _ => Self::Auto,
        }
    }
}

/// What a response body was decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResponseKind {
    #[display("json")]
    Structured,
    #[display("text")]
    Text,
    #[display("js")]
    Script,
    #[display("blob")]
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum RenderFormat {
    #[default]
    #[display("html")]
    Markup,
    #[display("text")]
    PlainText,
}

impl RenderFormat {
    /// Anything but `html` renders as plain text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("html") {
            Self::Markup
        } else {
            Self::PlainText
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum Placement {
    #[default]
    #[display("reset")]
    Replace,
    #[display("append")]
    Append,
    #[display("prepend")]
    Prepend,
}

impl Placement {
    /// Accepts the keyword or numeric forms; unknown values replace.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "append" => Self::Append,
            "-1" | "prepend" => Self::Prepend,
            _ => Self::Replace,
        }
    }
}

/// How content is written into a target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderDirective {
    pub format: RenderFormat,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(Blob),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            FormValue::File(_) => None,
        }
    }
}

/// Ordered multi-value field collection, the shape of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: impl Into<String>, blob: Blob) {
        self.entries.push((name.into(), FormValue::File(blob)));
    }

    /// Appends every entry of `other`, keeping duplicates.
    pub fn extend(&mut self, other: FormData) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn get_all(&self, name: &str) -> Vec<&FormValue> {
        self.entries
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value)
            .collect()
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Multipart(FormData),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Serialized text body, if the body is a byte payload.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            RequestBody::Bytes(bytes) => Some(String::from_utf8_lossy(bytes)),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&FormData> {
        match self {
            RequestBody::Multipart(form) => Some(form),
            _ => None,
        }
    }
}

/// Passthrough options carried to the transport unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchOptions {
    pub mode: Option<String>,
    pub credentials: Option<String>,
    pub cache: Option<String>,
    pub redirect: Option<String>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<String>,
}

/// The fully resolved request an activation sends.
#[derive(Debug, Clone)]
pub struct ActivationRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Pairs merged into `url` for read-only methods
    pub query: Vec<(String, String)>,
    pub deadline: Option<Duration>,
    pub options: FetchOptions,
}

/// Decoded response content.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(Value),
    Text(String),
    Script(String),
    Binary(Blob),
}

impl Payload {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Payload::Structured(_) => ResponseKind::Structured,
            Payload::Text(_) => ResponseKind::Text,
            Payload::Script(_) => ResponseKind::Script,
            Payload::Binary(_) => ResponseKind::Binary,
        }
    }

    /// Text written into the target element for this payload.
    pub fn render_text(&self, binary_placeholder: &str) -> String {
        match self {
            Payload::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Text(text) | Payload::Script(text) => text.clone(),
            Payload::Binary(_) => binary_placeholder.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub payload: Payload,
    pub status_ok: bool,
}

impl ParsedResponse {
    pub fn kind(&self) -> ResponseKind {
        self.payload.kind()
    }
}
