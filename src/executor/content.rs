//! Response body classification.

use crate::models::ResponseData;

/// Broad category of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    /// JSON or a `+json` structured syntax suffix.
    Json,
    /// Human-readable text (HTML, XML, plain text, JavaScript, forms).
    Text,
    /// Anything else.
    Binary,
}

/// Classifies a content type header value.
///
/// A missing content type is treated as text when the body is valid UTF-8.
pub fn classify(content_type: Option<&str>, body: &[u8]) -> ContentCategory {
    let Some(content_type) = content_type else {
        return if std::str::from_utf8(body).is_ok() {
            ContentCategory::Text
        } else {
            ContentCategory::Binary
        };
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") || mime == "text/json" {
        ContentCategory::Json
    } else if mime.starts_with("text/")
        || mime.ends_with("+xml")
        || matches!(
            mime.as_str(),
            "application/xml"
                | "application/javascript"
                | "application/x-www-form-urlencoded"
                | "application/graphql"
                | "application/yaml"
                | "application/x-yaml"
        )
    {
        ContentCategory::Text
    } else {
        ContentCategory::Binary
    }
}

/// Decodes a response body according to its content type.
///
/// JSON bodies that fail to parse fall back to text. Binary bodies are
/// replaced by a size descriptor.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> ResponseData {
    match classify(content_type, body) {
        ContentCategory::Json => match serde_json::from_slice(body) {
            Ok(value) => ResponseData::Json(value),
            Err(e) => {
                log::debug!("Response declared JSON but failed to parse: {}", e);
                ResponseData::Text(String::from_utf8_lossy(body).into_owned())
            }
        },
        ContentCategory::Text => ResponseData::Text(String::from_utf8_lossy(body).into_owned()),
        ContentCategory::Binary => ResponseData::Binary {
            content_type: content_type.unwrap_or("application/octet-stream").to_string(),
            size: body.len(),
        },
    }
}
