use crate::error::ParseError;
use crate::transport::TransportResponse;
use crate::types::{Blob, ParsedResponse, Payload, ResponseKind, ResponsePreference};

/// Explicit preference first, then the declared content type.
pub fn classify(preference: ResponsePreference, content_type: Option<&str>) -> ResponseKind {
    match preference {
        ResponsePreference::Structured => return ResponseKind::Structured,
        ResponsePreference::Text => return ResponseKind::Text,
        ResponsePreference::Binary => return ResponseKind::Binary,
        ResponsePreference::Auto => {}
    }

    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    let essence = content_type.split(';').next().unwrap_or_default().trim();

    if essence == "application/json" || essence.ends_with("+json") {
        ResponseKind::Structured
    } else if essence == "application/javascript" || essence == "text/javascript" {
        ResponseKind::Script
    } else if essence.starts_with("text/") || content_type.contains("charset=") {
        ResponseKind::Text
    } else {
        ResponseKind::Binary
    }
}

/// Decodes the buffered body. Only structured decoding can fail; the raw
/// text is recovered from the same buffer.
pub fn decode(kind: ResponseKind, response: &TransportResponse) -> Result<ParsedResponse, ParseError> {
    let payload = match kind {
        ResponseKind::Structured => match serde_json::from_slice(&response.body) {
            Ok(value) => Payload::Structured(value),
            Err(error) => return Err(ParseError::new(response.text(), error)),
        },
        ResponseKind::Text => Payload::Text(response.text().into_owned()),
        ResponseKind::Script => Payload::Script(response.text().into_owned()),
        ResponseKind::Binary => {
            let mut blob = Blob::new(response.body.clone());
            if let Some(content_type) = response.content_type() {
                blob = blob.with_content_type(content_type);
            }
            Payload::Binary(blob)
        }
    };

    Ok(ParsedResponse {
        payload,
        status_ok: response.ok(),
    })
}

pub fn parse(preference: ResponsePreference, response: &TransportResponse) -> Result<ParsedResponse, ParseError> {
    decode(classify(preference, response.content_type()), response)
}
