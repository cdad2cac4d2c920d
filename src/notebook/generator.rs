//! Notebook generation for an endpoint.
//!
//! The generated cell sequence is deterministic for a given endpoint and
//! environment list:
//!
//! 1. a title cell
//! 2. a collapsible cell listing parameters and example bodies
//! 3. an environment cell, only when the schema has several environments
//! 4. a JSON variables cell
//! 5. the HTTP request

use super::{NotebookCell, NotebookDocument};
use crate::endpoint::{Endpoint, Parameter, ParameterLocation};
use crate::environment::{AuthKind, Environment};
use serde_json::{json, Map, Value};

/// Base URL placed in the variables cell when no environment is selected.
pub const PLACEHOLDER_BASE_URL: &str = "https://api.example.com";

/// API key placeholder. Never a real credential.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key";

const LOCATIONS: [ParameterLocation; 3] = [
    ParameterLocation::Path,
    ParameterLocation::Query,
    ParameterLocation::Header,
];

/// Builds a notebook for an endpoint.
///
/// `environments` are the environments of the endpoint's schema; `selected`
/// is the one the notebook will run against, if any.
pub fn create_endpoint_notebook(
    endpoint: &Endpoint,
    environments: &[Environment],
    selected: Option<&Environment>,
) -> NotebookDocument {
    let mut cells = vec![
        NotebookCell::markup(title_markdown(endpoint)).with_id("title"),
        NotebookCell::markup(details_markdown(endpoint)).with_id("details"),
    ];

    if environments.len() > 1 {
        cells.push(NotebookCell::markup(environments_markdown(environments, selected)).with_id("environments"));
    }

    cells.push(NotebookCell::json(variables_json(endpoint, selected)).with_id("variables"));
    cells.push(NotebookCell::http(request_skeleton(endpoint, selected)).with_id("request"));

    let mut metadata = json!({
        "endpoint": {
            "method": endpoint.method.as_str(),
            "path": endpoint.path,
        }
    });
    if let Some(environment) = selected {
        metadata["environmentId"] = json!(environment.id);
        if let Some(schema_id) = &environment.schema_id {
            metadata["schemaId"] = json!(schema_id);
        }
    }

    NotebookDocument::new(cells).with_metadata(metadata)
}

fn title_markdown(endpoint: &Endpoint) -> String {
    let mut out = format!("# {}\n\n`{} {}`", endpoint.title(), endpoint.method, endpoint.path);
    if let Some(description) = endpoint.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        out.push_str("\n\n");
        out.push_str(description);
    }
    if !endpoint.tags.is_empty() {
        out.push_str(&format!("\n\nTags: {}", endpoint.tags.join(", ")));
    }
    out
}

fn details_markdown(endpoint: &Endpoint) -> String {
    let mut out = String::from("<details>\n<summary>Parameters and examples</summary>\n");

    let mut has_parameters = false;
    for location in LOCATIONS {
        let parameters: Vec<&Parameter> = endpoint.parameters_in(location).collect();
        if parameters.is_empty() {
            continue;
        }
        has_parameters = true;
        out.push_str(&format!("\n#### {}\n\n", location.title()));
        out.push_str("| Name | Type | Required | Description |\n|------|------|----------|-------------|\n");
        for parameter in parameters {
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                parameter.name,
                parameter.schema_type.as_deref().unwrap_or("string"),
                if parameter.required { "yes" } else { "no" },
                parameter.description.as_deref().unwrap_or("").replace('|', "\\|"),
            ));
        }
    }
    if !has_parameters {
        out.push_str("\nThis endpoint takes no parameters.\n");
    }

    if let Some(body) = &endpoint.request_body {
        out.push_str(&format!("\n#### Example request body\n\n```json\n{}\n```\n", pretty(body)));
    }

    for response in &endpoint.responses {
        out.push_str(&format!("\n#### Response {}", response.status));
        if !response.description.is_empty() {
            out.push_str(&format!(": {}", response.description));
        }
        out.push('\n');
        if let Some(example) = &response.example {
            out.push_str(&format!("\n```json\n{}\n```\n", pretty(example)));
        }
    }

    out.push_str("\n</details>");
    out
}

fn environments_markdown(environments: &[Environment], selected: Option<&Environment>) -> String {
    let mut out = format!(
        "## Environments\n\nThis schema has {} environments. Select the one to run against; `baseUrl` in the variables cell follows it.\n\n",
        environments.len()
    );
    for environment in environments {
        let marker = if selected.map(|s| s.id == environment.id).unwrap_or(false) {
            " (selected)"
        } else {
            ""
        };
        out.push_str(&format!(
            "- **{}**{}: `{}`\n",
            environment.name,
            marker,
            environment.trimmed_base_url()
        ));
    }
    out.trim_end().to_string()
}

fn variables_json(endpoint: &Endpoint, selected: Option<&Environment>) -> String {
    let mut variables = Map::new();
    variables.insert(
        "baseUrl".to_string(),
        json!(selected.map(Environment::trimmed_base_url).unwrap_or(PLACEHOLDER_BASE_URL)),
    );
    variables.insert("apiKey".to_string(), json!(PLACEHOLDER_API_KEY));

    for name in endpoint.path_parameter_names() {
        let parameter = endpoint
            .parameters
            .iter()
            .find(|p| p.name == name && p.location == ParameterLocation::Path);
        variables.insert(name, placeholder_value(parameter));
    }
    for parameter in endpoint
        .parameters
        .iter()
        .filter(|p| p.required && matches!(p.location, ParameterLocation::Query | ParameterLocation::Header))
    {
        variables
            .entry(parameter.name.clone())
            .or_insert_with(|| placeholder_value(Some(parameter)));
    }

    pretty(&Value::Object(variables))
}

fn placeholder_value(parameter: Option<&Parameter>) -> Value {
    match parameter.and_then(|p| p.schema_type.as_deref()) {
        Some("integer") | Some("number") => json!(1),
        Some("boolean") => json!(true),
        _ => json!("value"),
    }
}

fn request_skeleton(endpoint: &Endpoint, selected: Option<&Environment>) -> String {
    let mut lines = vec![
        format!("{} {{{{baseUrl}}}}{}", endpoint.method, endpoint.templated_path()),
        "Accept: application/json".to_string(),
    ];

    if endpoint.method.sends_body() {
        lines.push("Content-Type: application/json".to_string());
    }

    for parameter in endpoint
        .parameters_in(ParameterLocation::Header)
        .filter(|p| p.required)
    {
        lines.push(format!("{0}: {{{{{0}}}}}", parameter.name));
    }

    if let Some(auth) = selected.and_then(|environment| environment.auth.as_ref()) {
        match auth.kind {
            AuthKind::Bearer => lines.push("Authorization: Bearer {{apiKey}}".to_string()),
            AuthKind::ApiKey => lines.push(format!("{}: {{{{apiKey}}}}", auth.api_key_header())),
            AuthKind::Basic => lines.push("Authorization: Basic {{apiKey}}".to_string()),
            AuthKind::None | AuthKind::Other => {}
        }
    }

    if endpoint.method.sends_body() {
        let body = endpoint
            .request_body
            .as_ref()
            .map(pretty)
            .unwrap_or_else(|| "{\n  \n}".to_string());
        lines.push(String::new());
        lines.push(body);
    }

    lines.join("\n")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
