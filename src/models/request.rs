//! HTTP request data models.
//!
//! This module defines the request produced by the parser and consumed by the
//! executor, along with the fixed whitelist of methods a request line may use.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP request method.
///
/// Only the methods listed here are accepted on a request line; anything
/// else is reported as an invalid method by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
}

impl HttpMethod {
    /// Every accepted method, in the order used by error messages.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::PATCH,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
        HttpMethod::TRACE,
    ];

    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
        }
    }

    /// Parses a string into an HttpMethod, ignoring case.
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the string is a whitelisted method, `None` otherwise.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "TRACE" => Some(HttpMethod::TRACE),
            _ => None,
        }
    }

    /// Whether a request body is attached when sending with this method.
    ///
    /// Bodies are only sent for POST, PUT and PATCH.
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request parsed from notebook cell text or a request document.
///
/// Produced fresh for every execution. Header order follows the source text;
/// a repeated header name replaces the earlier value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRequest {
    /// HTTP method, normalized to uppercase.
    pub method: HttpMethod,

    /// Absolute URL after variable substitution.
    pub url: String,

    /// Request headers in source order.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Raw body text, present only when a body section exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Environment whose configuration and credentials should be applied.
    ///
    /// When set, the executor resolves headers and authentication for this
    /// environment before sending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,

    /// URI of the document the request was read from.
    ///
    /// Used to look up real values for masked headers in the secret store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
}

impl ParsedRequest {
    /// Creates a request with no headers, body or environment binding.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
            environment_id: None,
            document_uri: None,
        }
    }

    /// Adds a header. A header with the exact same name is replaced.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Sets the request body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    /// Binds the request to an environment.
    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    /// Binds the request to the document it was read from.
    pub fn with_document(mut self, document_uri: impl Into<String>) -> Self {
        self.document_uri = Some(document_uri.into());
        self
    }

    /// Looks up a header value ignoring the case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Checks if the request has a non-empty body.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().map_or(false, |b| !b.is_empty())
    }
}

/// Inserts a header, replacing any existing header whose name matches
/// ignoring case.
///
/// The new value takes the position of the header it replaces so that
/// overlaying one header set on another keeps a stable order.
pub fn insert_header(headers: &mut IndexMap<String, String>, name: &str, value: &str) {
    let existing = headers
        .keys()
        .position(|k| k.eq_ignore_ascii_case(name));

    match existing {
        Some(index) => {
            headers.shift_remove_index(index);
            headers.shift_insert(index, name.to_string(), value.to_string());
        }
        None => {
            headers.insert(name.to_string(), value.to_string());
        }
    }
}
