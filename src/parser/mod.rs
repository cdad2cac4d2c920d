//! Request text parser.
//!
//! Turns the loosely structured text of an HTTP cell or request document into
//! a [`ParsedRequest`]:
//!
//! ```text
//! # comments are ignored
//! POST {{baseUrl}}/users
//! Content-Type: application/json
//! Authorization: Bearer abcd********  # trailing comments are stripped
//!
//! {"name": "{{name}}"}
//! ```
//!
//! The request line is located by scanning every line for the shape
//! `METHOD http(s)://...` rather than taking the first non-empty line, so a
//! stray line such as `FOR data processing` above the request is never
//! mistaken for it.

pub mod error;

pub use error::FormatError;

use crate::models::{HttpMethod, ParsedRequest};
use crate::variables::VariableContext;
use once_cell::sync::Lazy;
use regex::Regex;

/// A line shaped like a request line: a whitelisted method followed by an
/// http(s) URL.
static REQUEST_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS|TRACE)\s+https?://\S*")
        .expect("Failed to compile request line regex")
});

/// Matches an optional trailing protocol version token, e.g. `HTTP/1.1`.
static HTTP_VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^HTTP/\d+(?:\.\d+)?$").expect("Failed to compile HTTP version regex")
});

/// Parses request text after substituting variables from `variables`.
///
/// # Errors
///
/// Returns a [`FormatError`] when no request line can be found, when the
/// request line uses a method outside the whitelist, or when its URL is not
/// a valid absolute URL after substitution.
///
/// # Examples
///
/// ```
/// use api_notebook::parser::parse_request;
/// use api_notebook::variables::VariableContext;
///
/// let request = parse_request(
///     "GET https://api.example.com/users\nAuthorization: Bearer abc",
///     &VariableContext::new(),
/// ).unwrap();
///
/// assert_eq!(request.method.as_str(), "GET");
/// assert_eq!(request.headers["Authorization"], "Bearer abc");
/// assert!(request.body.is_none());
/// ```
pub fn parse_request(content: &str, variables: &VariableContext) -> Result<ParsedRequest, FormatError> {
    let substituted = variables.substitute(content);
    parse_substituted(&substituted)
}

/// Parses request text that has already had its variables substituted.
pub fn parse_substituted(content: &str) -> Result<ParsedRequest, FormatError> {
    let normalized = content.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let request_idx = find_request_line(&lines)?;
    let (method, url) = parse_request_line(lines[request_idx], request_idx + 1)?;

    let mut request = ParsedRequest::new(method, url);
    let mut body_start = None;

    for (idx, line) in lines.iter().enumerate().skip(request_idx + 1) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            body_start = Some(idx + 1);
            break;
        }

        // A JSON body written directly under the headers
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            body_start = Some(idx);
            break;
        }

        if is_comment(trimmed) {
            continue;
        }

        match parse_header_line(trimmed) {
            Some((name, value)) => request.add_header(name, value),
            None => log::debug!("Ignoring malformed header line {}: '{}'", idx + 1, trimmed),
        }
    }

    if let Some(start) = body_start {
        request.body = extract_body(&lines[start.min(lines.len())..]);
    }

    Ok(request)
}

/// Finds the index of the request line.
///
/// Comment lines are skipped. The first line shaped like a request line wins;
/// if there is none, the first remaining non-empty line is returned so that
/// [`parse_request_line`] can report what is wrong with it.
pub fn find_request_line(lines: &[&str]) -> Result<usize, FormatError> {
    let candidates = || {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !is_comment(trimmed)
            })
    };

    if let Some((idx, _)) = candidates().find(|(_, line)| REQUEST_LINE_REGEX.is_match(line)) {
        return Ok(idx);
    }

    candidates()
        .next()
        .map(|(idx, _)| idx)
        .ok_or(FormatError::NoRequestLine)
}

/// Parses a request line into its method and URL.
///
/// The line is split on whitespace: the first token is the method, the second
/// the URL. A trailing `HTTP/x.y` token is accepted and ignored.
pub fn parse_request_line(line: &str, line_num: usize) -> Result<(HttpMethod, String), FormatError> {
    let trimmed = line.trim();
    let mut tokens = trimmed.split_whitespace();

    let method_token = tokens.next().ok_or(FormatError::NoRequestLine)?;
    let url = tokens.next().ok_or_else(|| FormatError::MissingUrl {
        content: trimmed.to_string(),
        line: line_num,
    })?;

    if let Some(extra) = tokens.next() {
        if !HTTP_VERSION_REGEX.is_match(extra) {
            log::debug!("Ignoring trailing token '{}' on request line {}", extra, line_num);
        }
    }

    let method = HttpMethod::from_str(method_token).ok_or_else(|| FormatError::InvalidMethod {
        method: method_token.to_string(),
        line: line_num,
    })?;

    url::Url::parse(url).map_err(|e| FormatError::InvalidUrl {
        url: url.to_string(),
        line: line_num,
        reason: e.to_string(),
    })?;

    Ok((method, url.to_string()))
}

/// Splits a `Name: value` header line.
///
/// A trailing comment introduced by ` #` is stripped from the value.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }

    Some((name.to_string(), strip_inline_comment(value).trim().to_string()))
}

/// Removes a trailing ` #` comment from a header value.
pub fn strip_inline_comment(value: &str) -> &str {
    match value.find(" #") {
        Some(pos) => &value[..pos],
        None => value,
    }
}

/// Joins the non-empty body lines with newlines.
///
/// Returns `None` when no non-empty line remains.
pub fn extract_body(lines: &[&str]) -> Option<String> {
    let body_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if body_lines.is_empty() {
        None
    } else {
        Some(body_lines.join("\n"))
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with("//")
}
