//! Request templates captured for replay across environments.

use crate::environment::Environment;
use crate::executor::merge_headers;
use crate::history::{is_sensitive_header, HistoryEntry, REDACTED};
use crate::models::{HttpMethod, ParsedRequest};
use crate::secrets::is_masked;
use crate::variables::substitute_variables;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A snapshot of an executed request whose URL is relative to the
/// environment it ran in.
///
/// Credentials are never part of a template: authentication headers are
/// dropped on capture and synthesized again for each target environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTemplate {
    /// Template id.
    pub id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path and query relative to the base URL.
    pub path: String,
    /// Non-sensitive request headers.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Variables substituted into path, headers and body at replay time.
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// Environment the request originally ran in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_environment_id: Option<String>,
    /// Schema of the source environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    /// When the original request ran.
    pub executed_at: DateTime<Utc>,
    /// Notebook the original request came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_notebook_uri: Option<String>,
}

impl RequestTemplate {
    /// Captures a template from an executed request.
    pub fn from_request(request: &ParsedRequest, variables: Map<String, Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method: request.method,
            path: extract_relative_path(&request.url),
            headers: replayable_headers(&request.headers),
            body: request.body.clone(),
            variables: variables
                .into_iter()
                .filter(|(_, value)| value.as_str() != Some(REDACTED))
                .collect(),
            source_environment_id: request.environment_id.clone(),
            schema_id: None,
            executed_at: Utc::now(),
            source_notebook_uri: request.document_uri.clone(),
        }
    }

    /// Captures a template from a history entry.
    pub fn from_history_entry(entry: &HistoryEntry) -> Self {
        let mut template = Self::from_request(&entry.request, entry.variables.clone());
        template.source_environment_id = entry.environment_id.clone();
        template.schema_id = entry.schema_id.clone();
        template.executed_at = entry.timestamp;
        template.source_notebook_uri = entry.notebook_uri.clone();
        template
    }

    /// Builds the request for one environment.
    ///
    /// Template headers come first and `environment_headers` override them.
    /// The request is bound to the environment so the executor applies its
    /// authentication.
    pub fn to_request(
        &self,
        environment: &Environment,
        environment_headers: &IndexMap<String, String>,
    ) -> ParsedRequest {
        let substitute = |text: &str| substitute_variables(text, &self.variables);

        let headers: IndexMap<String, String> = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), substitute(value)))
            .collect();

        let mut request = ParsedRequest::new(
            self.method,
            build_url(environment.trimmed_base_url(), &substitute(&self.path)),
        )
        .with_environment(environment.id.clone());
        request.headers = merge_headers(&headers, environment_headers);
        request.body = self.body.as_deref().map(substitute);
        request
    }
}

fn replayable_headers(headers: &IndexMap<String, String>) -> IndexMap<String, String> {
    headers
        .iter()
        .filter(|(name, value)| {
            !is_sensitive_header(name) && !is_masked(value) && value.as_str() != REDACTED
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Strips scheme and host from a URL, keeping path and query.
///
/// A string that does not parse as an absolute URL is returned unchanged.
pub fn extract_relative_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(e) => {
            log::debug!("Keeping unparsable URL '{}' as template path: {}", url, e);
            url.to_string()
        }
    }
}

/// Joins a base URL and a relative path with exactly one slash.
pub fn build_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionResult, ResponseData, Timing};
    use serde_json::json;

    fn executed() -> ParsedRequest {
        let mut request = ParsedRequest::new(HttpMethod::POST, "https://dev.example.com/v1/users?page=2")
            .with_environment("dev")
            .with_document("file:///notebooks/users.apinb");
        request.add_header("Content-Type", "application/json");
        request.add_header("Authorization", "Bearer secret-token");
        request.add_header("X-Trace", "{{traceId}}");
        request.set_body(r#"{"name":"{{name}}"}"#);
        request
    }

    #[test]
    fn test_extract_relative_path() {
        assert_eq!(extract_relative_path("https://h.example.com/a/b?x=1&y=2"), "/a/b?x=1&y=2");
        assert_eq!(extract_relative_path("https://h.example.com"), "/");
        assert_eq!(extract_relative_path("/already/relative"), "/already/relative");
        assert_eq!(extract_relative_path("{{baseUrl}}/users"), "{{baseUrl}}/users");
    }

    #[test]
    fn test_build_url_uses_one_slash() {
        assert_eq!(build_url("https://a.test/", "/users"), "https://a.test/users");
        assert_eq!(build_url("https://a.test", "users"), "https://a.test/users");
        assert_eq!(build_url("https://a.test//", "//users"), "https://a.test/users");
    }

    #[test]
    fn test_from_history_entry_drops_credentials() {
        let result = ExecutionResult::from_response(
            201,
            "Created",
            IndexMap::new(),
            ResponseData::Json(json!({})),
            Timing::default(),
        );
        let variables = json!({"name": "Jo", "authToken": "abc"}).as_object().cloned().unwrap();
        let entry = HistoryEntry::new(executed(), &result, variables)
            .with_schema(Some("users-api".to_string()))
            .sanitized();

        let template = RequestTemplate::from_history_entry(&entry);

        assert_eq!(template.method, HttpMethod::POST);
        assert_eq!(template.path, "/v1/users?page=2");
        assert!(!template.headers.contains_key("Authorization"));
        assert_eq!(template.headers["Content-Type"], "application/json");
        assert_eq!(template.variables.get("name"), Some(&json!("Jo")));
        assert!(!template.variables.contains_key("authToken"));
        assert_eq!(template.source_environment_id.as_deref(), Some("dev"));
        assert_eq!(template.schema_id.as_deref(), Some("users-api"));
        assert_eq!(template.executed_at, entry.timestamp);
        assert_eq!(template.source_notebook_uri.as_deref(), Some("file:///notebooks/users.apinb"));
    }

    #[test]
    fn test_to_request_substitutes_and_overrides() {
        let mut variables = Map::new();
        variables.insert("traceId".to_string(), json!("t-1"));
        variables.insert("name".to_string(), json!("Jo"));
        let template = RequestTemplate::from_request(&executed(), variables);

        let environment = Environment::new("prod", "Production", "https://api.example.com/");
        let mut env_headers = IndexMap::new();
        env_headers.insert("x-trace".to_string(), "prod-trace".to_string());

        let request = template.to_request(&environment, &env_headers);

        assert_eq!(request.url, "https://api.example.com/v1/users?page=2");
        assert_eq!(request.header("X-Trace"), Some("prod-trace"));
        assert_eq!(request.body.as_deref(), Some(r#"{"name":"Jo"}"#));
        assert_eq!(request.environment_id.as_deref(), Some("prod"));
        assert!(request.header("Authorization").is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let template = RequestTemplate::from_request(&executed(), Map::new());
        let value = serde_json::to_value(&template).unwrap();
        assert!(value.get("sourceEnvironmentId").is_some());
        assert!(value.get("executedAt").is_some());
        assert_eq!(value["method"], "POST");
    }
}
