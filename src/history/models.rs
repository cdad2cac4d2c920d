//! History data models.

use crate::models::{ExecutionResult, ParsedRequest};
use crate::secrets::is_masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Headers whose values are never written to disk.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "auth-token",
    "x-auth-token",
    "access-token",
    "x-access-token",
];

/// Variable name fragments treated as secret in a variables snapshot.
const SENSITIVE_VARIABLE_FRAGMENTS: &[&str] = &["token", "apikey", "api_key", "password", "secret"];

/// Replacement for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Errors that can occur during history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading or writing the history file failed.
    #[error("History storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// An entry could not be serialized or deserialized.
    #[error("History serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Whether a header name is sensitive.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

/// Whether a variable name looks like it holds a secret.
pub fn is_sensitive_variable(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_VARIABLE_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// One executed HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique identifier.
    pub id: String,

    /// When the request was executed.
    pub timestamp: DateTime<Utc>,

    /// The request as sent, after variable substitution.
    pub request: ParsedRequest,

    /// Response status, 0 for transport failures.
    pub status: u16,

    /// Whether the status was in `[200, 300)`.
    pub success: bool,

    /// Elapsed time in milliseconds.
    pub duration_ms: u64,

    /// Environment the request ran against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,

    /// Schema of that environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    /// Notebook the request came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_uri: Option<String>,

    /// Variable context at execution time.
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl HistoryEntry {
    /// Records an execution.
    pub fn new(request: ParsedRequest, result: &ExecutionResult, variables: Map<String, Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            environment_id: request.environment_id.clone(),
            notebook_uri: request.document_uri.clone(),
            request,
            status: result.status,
            success: result.success,
            duration_ms: result.duration_ms(),
            schema_id: None,
            variables,
        }
    }

    /// Sets the schema id.
    pub fn with_schema(mut self, schema_id: Option<String>) -> Self {
        self.schema_id = schema_id;
        self
    }

    /// Returns a copy safe to persist.
    ///
    /// Sensitive and masked header values and secret-looking variables are
    /// replaced by [`REDACTED`].
    pub fn sanitized(&self) -> Self {
        let mut entry = self.clone();

        for (name, value) in entry.request.headers.iter_mut() {
            if is_sensitive_header(name) || is_masked(value) {
                *value = REDACTED.to_string();
            }
        }

        for (name, value) in entry.variables.iter_mut() {
            if is_sensitive_variable(name) {
                *value = Value::String(REDACTED.to_string());
            }
        }

        entry
    }
}
