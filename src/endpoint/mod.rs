//! Endpoint descriptions.
//!
//! An [`Endpoint`] is one operation taken from a validated API schema. It is
//! the input for notebook generation and for runner request documents.

use crate::models::HttpMethod;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static PATH_PARAM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("Failed to compile path parameter regex"));

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Templated into the path, e.g. `/users/{id}`.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParameterLocation {
    /// Section title used when listing parameters.
    pub fn title(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "Path parameters",
            ParameterLocation::Query => "Query parameters",
            ParameterLocation::Header => "Header parameters",
            ParameterLocation::Cookie => "Cookie parameters",
        }
    }
}

/// One operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter must be provided.
    #[serde(default)]
    pub required: bool,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Schema type name such as `string` or `integer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, location: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.into(),
            location,
            required,
            description: None,
            schema_type: None,
        }
    }
}

/// An example response of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseExample {
    /// Status code or range, e.g. `200` or `4XX`.
    pub status: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Example body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// One API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template relative to the base URL, e.g. `/pets/{petId}`.
    pub path: String,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Example request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Example responses.
    #[serde(default)]
    pub responses: Vec<ResponseExample>,
}

impl Endpoint {
    /// Creates an endpoint with only a method and path.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            summary: None,
            description: None,
            operation_id: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            request_body: None,
            responses: Vec::new(),
        }
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Display title: the summary, else `METHOD path`.
    pub fn title(&self) -> String {
        match self.summary.as_deref().map(str::trim) {
            Some(summary) if !summary.is_empty() => summary.to_string(),
            _ => format!("{} {}", self.method, self.path),
        }
    }

    /// Parameters sent in the given location, in declaration order.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// Names of the parameters templated into the path.
    ///
    /// Names are taken from the path itself so undeclared placeholders are
    /// included too.
    pub fn path_parameter_names(&self) -> Vec<String> {
        PATH_PARAM_REGEX
            .captures_iter(&self.path)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// The path with `{name}` placeholders turned into `{{name}}` variables
    /// and required query parameters appended.
    pub fn templated_path(&self) -> String {
        let path = PATH_PARAM_REGEX.replace_all(&self.path, "{{$1}}").into_owned();

        let query: Vec<String> = self
            .parameters_in(ParameterLocation::Query)
            .filter(|p| p.required)
            .map(|p| format!("{0}={{{{{0}}}}}", p.name))
            .collect();

        if query.is_empty() {
            path
        } else {
            let separator = if path.contains('?') { '&' } else { '?' };
            format!("{}{}{}", path, separator, query.join("&"))
        }
    }
}
