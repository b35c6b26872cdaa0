use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;
use crate::attribute::{self, names};
use crate::error::BodyBuildError;
use crate::surface::{Document, Element};
use crate::types::{Blob, FormData, RequestBody};

lazy_static! {
    static ref FORM_ID_SEPARATOR: Regex = Regex::new(r"\s*,\s*").unwrap();
}

const BLOB_KEY: &str = "$blob";
const ROOT_FILE_NAME: &str = "file";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";

/// Headers, body and query an element declares.
#[derive(Debug, Clone, Default)]
pub struct BuiltBody {
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Present only for read-only methods with a declared body
    pub query: Option<Vec<(String, String)>>,
    /// Set when a multipart body forces a body-carrying method
    pub method_override: Option<Method>,
    pub diagnostics: Vec<String>,
}

impl BuiltBody {
    fn diagnostic(&mut self, message: String) {
        warn!("{message}");
        self.diagnostics.push(message);
    }
}

pub fn is_read_only(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

pub fn build(document: &dyn Document, element: &dyn Element, method: &Method) -> Result<BuiltBody, BodyBuildError> {
    match attribute::non_empty(element, names::FORMS) {
        Some(forms) => build_multipart(document, element, method, &forms),
        None => build_plain(element, method),
    }
}

fn build_multipart(
    document: &dyn Document,
    element: &dyn Element,
    method: &Method,
    forms: &str,
) -> Result<BuiltBody, BodyBuildError> {
    let mut built = BuiltBody::default();
    let mut data = FormData::new();

    for form_id in FORM_ID_SEPARATOR.split(forms.trim()).filter(|id| !id.is_empty()) {
        match document.form_data(form_id) {
            Some(fields) => data.extend(fields),
            None => built.diagnostic(format!("fetch-forms: form not found: {form_id}")),
        }
    }

    if let Some(value) = declared_body(element)? {
        append_value(&mut data, &value, None);
    }

    if is_read_only(method) {
        built.diagnostic(format!("fetch-forms with {method} is not allowed, sending POST"));
        built.method_override = Some(Method::POST);
    }

    built.body = RequestBody::Multipart(data);
    Ok(built)
}

fn build_plain(element: &dyn Element, method: &Method) -> Result<BuiltBody, BodyBuildError> {
    let mut built = BuiltBody {
        headers: declared_headers(element)?,
        ..BuiltBody::default()
    };

    let Some(value) = declared_body(element)? else {
        return Ok(built);
    };

    if is_read_only(method) {
        built.query = Some(flatten_pairs(&value));
        return Ok(built);
    }

    if content_type_is(&built.headers, FORM_URLENCODED) && (value.is_object() || value.is_array()) {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(flatten_pairs(&value))
            .finish();
        built.body = RequestBody::Bytes(encoded.into_bytes());
    } else {
        if !built.headers.contains_key(CONTENT_TYPE) {
            built.headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }
        let text = serde_json::to_vec(&value).map_err(BodyBuildError::invalid_body)?;
        built.body = RequestBody::Bytes(text);
    }
    Ok(built)
}

/// Parsed `fetch-body`; an empty attribute declares nothing, `null` likewise.
fn declared_body(element: &dyn Element) -> Result<Option<Value>, BodyBuildError> {
    let Some(text) = attribute::non_empty(element, names::BODY) else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&text).map_err(BodyBuildError::invalid_body)?;
    Ok((!value.is_null()).then_some(value))
}

fn declared_headers(element: &dyn Element) -> Result<HeaderMap, BodyBuildError> {
    let mut headers = HeaderMap::new();
    let Some(text) = attribute::non_empty(element, names::HEADERS) else {
        return Ok(headers);
    };

    let value: Value = serde_json::from_str(&text).map_err(BodyBuildError::invalid_headers)?;
    let entries = match value {
        Value::Object(entries) => entries,
        Value::Null => return Ok(headers),
        _ => return Err(BodyBuildError::HeadersNotAnObject),
    };

    for (name, value) in entries {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|error| BodyBuildError::invalid_header(&name, error))?;
        let value = HeaderValue::from_str(&scalar_text(&value))
            .map_err(|error| BodyBuildError::invalid_header(&name, error))?;
        headers.insert(header, value);
    }
    Ok(headers)
}

/// Writes `pairs` into the query of `url`. A key already present keeps its
/// position and takes the new value, later duplicates of it are dropped;
/// new keys are appended.
pub fn apply_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }
    let mut query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (key, value) in pairs {
        match query.iter().position(|(existing, _)| existing == key) {
            Some(index) => {
                query[index].1 = value.clone();
                let mut position = 0;
                query.retain(|(existing, _)| {
                    let keep = existing != key || position == index;
                    position += 1;
                    keep
                });
            }
            None => query.push((key.clone(), value.clone())),
        }
    }

    url.query_pairs_mut().clear().extend_pairs(query);
}

fn content_type_is(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(expected))
}

/// String form of a JSON value as it appears in a query or header.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn path(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}[{key}]"),
        None => key.to_string(),
    }
}

/// One pair per top-level key; nested containers use bracket paths, a
/// top-level `null` is kept as the text `null`, nested `null`s are dropped.
pub fn flatten_pairs(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    match value {
        Value::Object(entries) => {
            for (key, value) in entries {
                match value {
                    Value::Object(_) | Value::Array(_) => flatten_nested(&mut pairs, value, key),
                    other => pairs.push((key.clone(), scalar_text(other))),
                }
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let key = index.to_string();
                match value {
                    Value::Object(_) | Value::Array(_) => flatten_nested(&mut pairs, value, &key),
                    other => pairs.push((key, scalar_text(other))),
                }
            }
        }
        _ => {}
    }
    pairs
}

fn flatten_nested(pairs: &mut Vec<(String, String)>, value: &Value, prefix: &str) {
    match value {
        Value::Null => {}
        Value::Object(entries) => {
            for (key, value) in entries {
                flatten_nested(pairs, value, &path(Some(prefix), key));
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten_nested(pairs, value, &path(Some(prefix), &index.to_string()));
            }
        }
        scalar => pairs.push((prefix.to_string(), scalar_text(scalar))),
    }
}

fn as_blob(entries: &Map<String, Value>) -> Option<Blob> {
    let content = entries.get(BLOB_KEY)?.as_str()?;
    let mut blob = Blob::new(content.as_bytes().to_vec());
    if let Some(content_type) = entries.get("type").and_then(Value::as_str) {
        blob = blob.with_content_type(content_type);
    }
    if let Some(name) = entries.get("name").and_then(Value::as_str) {
        blob = blob.with_name(name);
    }
    Some(blob)
}

/// Flattens `value` into multipart fields. Root scalars have no field name
/// and are ignored.
fn append_value(data: &mut FormData, value: &Value, prefix: Option<&str>) {
    match value {
        Value::Null => {}
        Value::Object(entries) => match as_blob(entries) {
            Some(blob) => data.append_file(prefix.unwrap_or(ROOT_FILE_NAME), blob),
            None => {
                for (key, value) in entries {
                    append_value(data, value, Some(&path(prefix, key)));
                }
            }
        },
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                append_value(data, value, Some(&path(prefix, &index.to_string())));
            }
        }
        scalar => {
            if let Some(prefix) = prefix {
                data.append(prefix, scalar_text(scalar));
            }
        }
    }
}
