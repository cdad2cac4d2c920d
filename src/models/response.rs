//! Execution result data models.
//!
//! An [`ExecutionResult`] is produced for every request the executor runs,
//! including requests that never reached the server.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timing of one request.
///
/// Older results only recorded a duration in milliseconds; newer ones carry
/// wall-clock start and end timestamps as well. Both shapes deserialize and
/// consumers should read the duration through [`Timing::duration_ms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timing {
    /// Start and end as milliseconds since the Unix epoch, plus the duration.
    Span {
        /// Epoch milliseconds just before the request was sent.
        start: i64,
        /// Epoch milliseconds after the body was consumed.
        end: i64,
        /// Elapsed milliseconds measured with a monotonic clock.
        duration: u64,
    },
    /// Duration in milliseconds.
    Millis(u64),
}

impl Timing {
    /// Returns the elapsed time in milliseconds regardless of shape.
    pub fn duration_ms(&self) -> u64 {
        match self {
            Timing::Span { duration, .. } => *duration,
            Timing::Millis(ms) => *ms,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::Millis(0)
    }
}

/// Decoded response body.
///
/// Variant order matters for deserialization: the binary descriptor is tried
/// first, then plain text, then any JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Placeholder for bodies that are neither JSON nor text.
    Binary {
        /// Content type reported by the server.
        #[serde(rename = "contentType")]
        content_type: String,
        /// Body size in bytes.
        size: usize,
    },
    /// Text body, also used when a JSON body fails to parse.
    Text(String),
    /// Parsed JSON body.
    Json(Value),
}

impl ResponseData {
    /// Returns the parsed JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a text rendering of the body suitable for display.
    pub fn to_display_string(&self) -> String {
        match self {
            ResponseData::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ResponseData::Text(text) => text.clone(),
            ResponseData::Binary { content_type, size } => {
                format!("<binary data: {}, {} bytes>", content_type, size)
            }
        }
    }
}

/// Outcome of one request execution.
///
/// `status` is `0` when the request failed at the transport level, in which
/// case `error` carries the message. HTTP error statuses are not errors at
/// this level: a 404 has `success == false` and no `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// HTTP status code, or 0 for a transport failure.
    pub status: u16,

    /// Reason phrase for the status.
    pub status_text: String,

    /// Response headers keyed by lower-case name.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Decoded body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,

    /// Request timing.
    #[serde(default)]
    pub timing: Timing,

    /// True iff the status is in `[200, 300)`.
    pub success: bool,

    /// Transport failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Builds a result for a response that reached the client.
    pub fn from_response(
        status: u16,
        status_text: impl Into<String>,
        headers: IndexMap<String, String>,
        data: ResponseData,
        timing: Timing,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            data: Some(data),
            timing,
            success: (200..300).contains(&status),
            error: None,
        }
    }

    /// Builds a result for a request that failed before a response arrived.
    pub fn transport_failure(message: impl Into<String>, timing: Timing) -> Self {
        Self {
            status: 0,
            status_text: "Error".to_string(),
            headers: IndexMap::new(),
            data: None,
            timing,
            success: false,
            error: Some(message.into()),
        }
    }

    /// Whether the request failed at the transport level.
    pub fn is_transport_failure(&self) -> bool {
        self.status == 0 || self.error.is_some()
    }

    /// Returns the parsed JSON body, if any.
    pub fn json_body(&self) -> Option<&Value> {
        self.data.as_ref().and_then(ResponseData::as_json)
    }

    /// Returns the elapsed time in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.timing.duration_ms()
    }

    /// Returns the content type header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Formats the status line, e.g. `200 OK`.
    pub fn status_line(&self) -> String {
        if self.is_transport_failure() {
            "Request failed".to_string()
        } else {
            format!("{} {}", self.status, self.status_text)
        }
    }
}
