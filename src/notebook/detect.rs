//! Content sniffing for cells with an unsupported language.
//!
//! Each predicate looks at the text alone and is independent of the others.

use once_cell::sync::Lazy;
use regex::Regex;

/// An uppercase whitelisted method followed by a target, or any-case method
/// followed by an absolute URL or a `{{variable}}`.
static HTTP_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS|TRACE)\s+\S+|(?i:get|post|put|delete|patch|head|options|trace)\s+(?:https?://|\{\{)\S*)",
    )
    .expect("Failed to compile HTTP line regex")
});

static MARKDOWN_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:#{1,6}\s+\S|[-*+]\s+\S|\d+\.\s+\S|>\s|```)").expect("Failed to compile markdown regex")
});

/// Whether a single line starts an HTTP request.
pub fn is_request_line(line: &str) -> bool {
    HTTP_LINE_REGEX.is_match(line.trim())
}

/// Whether the text looks like an HTTP request: its first line that is not
/// blank or a comment is a request line.
pub fn looks_like_http(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(is_request_line)
        .unwrap_or(false)
}

/// Whether the text is a JSON object or array.
pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
}

/// Whether the text starts like markdown: a header, a list item, a quote or
/// a code fence.
pub fn looks_like_markdown(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| MARKDOWN_LINE_REGEX.is_match(line))
        .unwrap_or(false)
}
