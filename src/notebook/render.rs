//! Markdown rendering of requests and responses for cell outputs.

use crate::executor::format_duration_ms;
use crate::history::is_sensitive_header;
use crate::models::{ExecutionResult, ParsedRequest, ResponseData};
use crate::secrets::{is_masked, mask_value};
use indexmap::IndexMap;
use serde_json::{json, Value};

/// Characters of a sensitive header value shown in rendered output.
const RENDER_VISIBLE_CHARS: usize = 4;

/// Pretty-prints a body when it is JSON.
///
/// Returns the code fence language and the text to show.
pub fn pretty_body(body: &str) -> (&'static str, String) {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => (
            "json",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        ),
        Err(_) => ("text", body.to_string()),
    }
}

/// Renders headers as a markdown list, masking sensitive values.
pub fn render_headers(headers: &IndexMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("- `{}`: `{}`", name, display_header_value(name, value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_header_value(name: &str, value: &str) -> String {
    if is_sensitive_header(name) && !is_masked(value) {
        mask_value(value, RENDER_VISIBLE_CHARS)
    } else {
        value.to_string()
    }
}

/// Renders the request block of an HTTP cell.
pub fn render_request_details(request: &ParsedRequest) -> String {
    let mut out = format!("### Request\n\n`{} {}`\n", request.method, request.url);

    if !request.headers.is_empty() {
        out.push_str("\n**Headers**\n\n");
        out.push_str(&render_headers(&request.headers));
        out.push('\n');
    }

    if let Some(body) = request.body.as_deref().filter(|b| !b.is_empty()) {
        let (language, text) = pretty_body(body);
        out.push_str(&format!("\n**Body**\n\n```{}\n{}\n```\n", language, text));
    }

    out
}

/// Renders the response block of an HTTP cell.
pub fn render_response(result: &ExecutionResult) -> String {
    let mut out = format!(
        "### Response\n\n**Status:** {} | **Time:** {}\n",
        result.status_line(),
        format_duration_ms(result.duration_ms())
    );

    if let Some(error) = &result.error {
        out.push_str(&format!("\n**Error:** {}\n", error));
    }

    if !result.headers.is_empty() {
        out.push_str("\n<details>\n<summary>Headers</summary>\n\n");
        out.push_str(&render_headers(&result.headers));
        out.push_str("\n\n</details>\n");
    }

    match &result.data {
        Some(ResponseData::Json(value)) => {
            let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            out.push_str(&format!("\n```json\n{}\n```\n", text));
        }
        Some(ResponseData::Text(text)) if !text.is_empty() => {
            let (language, text) = pretty_body(text);
            out.push_str(&format!("\n```{}\n{}\n```\n", language, text));
        }
        Some(data @ ResponseData::Binary { .. }) => {
            out.push_str(&format!("\n_{}_\n", data.to_display_string()));
        }
        _ => {}
    }

    out
}

/// Structured output for downstream tooling.
///
/// Sensitive request header values are masked.
pub fn structured_output(request: &ParsedRequest, result: &ExecutionResult) -> Value {
    let headers: IndexMap<String, String> = request
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), display_header_value(name, value)))
        .collect();

    json!({
        "request": {
            "method": request.method.as_str(),
            "url": request.url,
            "headers": headers,
            "body": request.body,
        },
        "response": result,
    })
}
