//! Notebook document format.
//!
//! Cells are stored between tagged HTML comment markers so the file still
//! reads as markdown:
//!
//! ```text
//! <!-- api-notebook {"schemaId":"petstore"} -->
//!
//! <!-- cell id="title" kind="markup" language="markdown" -->
//! # List pets
//! <!-- /cell -->
//!
//! <!-- cell id="request" kind="code" language="http" -->
//! GET {{baseUrl}}/pets
//! <!-- /cell -->
//! ```
//!
//! Marker lines inside cell content are dropped when serializing. Text found
//! outside any cell is kept as a markup cell.

use super::detect::{is_request_line, looks_like_json};
use super::{CellKind, CellLanguage, NotebookCell, NotebookDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

const METADATA_PREFIX: &str = "<!-- api-notebook ";
const MARKER_SUFFIX: &str = "-->";
const CELL_START_PREFIX: &str = "<!-- cell";
const CELL_END: &str = "<!-- /cell -->";
const SECTION_DELIMITER: &str = "###";
const VARIABLES_TAG: &str = "# @variables";

static CELL_START_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<!-- cell((?:\s+[a-z]+="[^"]*")*)\s*-->$"#).expect("Failed to compile cell marker regex")
});

static ATTRIBUTE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-z]+)="([^"]*)""#).expect("Failed to compile attribute regex"));

static MARKDOWN_HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+\S").expect("Failed to compile markdown header regex"));

/// Errors found while reading a notebook document.
///
/// [`deserialize`] never returns these; it falls back to a document that
/// preserves the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// A cell was opened and never closed.
    #[error("cell starting at line {line} is never closed")]
    UnterminatedCell {
        /// Line of the opening marker
        line: usize,
    },

    /// A cell was opened inside another cell.
    #[error("cell marker at line {line} is nested inside another cell")]
    NestedCell {
        /// Line of the nested marker
        line: usize,
    },

    /// A closing marker without an open cell.
    #[error("closing marker at line {line} has no matching cell")]
    StrayEnd {
        /// Line of the closing marker
        line: usize,
    },

    /// A line looks like a cell marker but cannot be read.
    #[error("malformed cell marker at line {line}")]
    MalformedMarker {
        /// Line of the marker
        line: usize,
    },

    /// The metadata marker does not hold a JSON value.
    #[error("invalid notebook metadata: {0}")]
    InvalidMetadata(String),
}

/// Serializes a notebook.
pub fn serialize(document: &NotebookDocument) -> Vec<u8> {
    let mut out = String::new();

    if let Some(metadata) = &document.metadata {
        out.push_str(METADATA_PREFIX);
        out.push_str(&metadata.to_string());
        out.push(' ');
        out.push_str(MARKER_SUFFIX);
        out.push_str("\n\n");
    }

    for (index, cell) in document.cells.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&start_marker(cell));
        out.push('\n');

        let content = strip_markers(&cell.content);
        if !content.is_empty() {
            out.push_str(&content);
            out.push('\n');
        }

        out.push_str(CELL_END);
        out.push('\n');
    }

    out.into_bytes()
}

/// Deserializes a notebook.
///
/// Never fails and never returns an empty cell list: unreadable input
/// becomes a single markup cell with a warning followed by the raw text, and
/// a document without cells gets one empty markup cell.
pub fn deserialize(bytes: &[u8]) -> NotebookDocument {
    let text = String::from_utf8_lossy(bytes);

    let mut document = match parse_document(&text) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("Failed to parse notebook, showing raw content: {}", e);
            return NotebookDocument::new(vec![fallback_cell(&e, &text)]);
        }
    };

    if document.cells.is_empty() {
        document.cells.push(NotebookCell::markup(""));
    }
    document
}

/// Parses a notebook document, reporting malformed structure.
pub fn parse_document(text: &str) -> Result<NotebookDocument, SerializationError> {
    let normalized = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = normalized.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }

    let mut document = NotebookDocument::default();
    let mut open: Option<(usize, NotebookCell, Vec<&str>)> = None;
    let mut loose: Vec<&str> = Vec::new();
    let mut seen_content = false;

    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx + 1;
        let trimmed = line.trim();

        if !seen_content && open.is_none() && trimmed.starts_with(METADATA_PREFIX) {
            document.metadata = Some(parse_metadata(trimmed)?);
            seen_content = true;
            continue;
        }
        if !trimmed.is_empty() {
            seen_content = true;
        }

        if trimmed == CELL_END {
            let (_, mut cell, content) = open.take().ok_or(SerializationError::StrayEnd { line: line_num })?;
            cell.content = content.join("\n");
            document.cells.push(cell);
            continue;
        }

        if trimmed.starts_with(CELL_START_PREFIX) {
            if open.is_some() {
                return Err(SerializationError::NestedCell { line: line_num });
            }
            flush_loose(&mut loose, &mut document.cells);
            let cell = parse_start_marker(trimmed).ok_or(SerializationError::MalformedMarker { line: line_num })?;
            open = Some((line_num, cell, Vec::new()));
            continue;
        }

        match open.as_mut() {
            Some((_, _, content)) => content.push(line),
            None => loose.push(line),
        }
    }

    if let Some((line, _, _)) = open {
        return Err(SerializationError::UnterminatedCell { line });
    }
    flush_loose(&mut loose, &mut document.cells);

    Ok(document)
}

fn parse_metadata(marker: &str) -> Result<Value, SerializationError> {
    let json = marker
        .strip_prefix(METADATA_PREFIX)
        .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
        .ok_or_else(|| SerializationError::InvalidMetadata("unterminated marker".to_string()))?;

    serde_json::from_str(json.trim()).map_err(|e| SerializationError::InvalidMetadata(e.to_string()))
}

fn parse_start_marker(marker: &str) -> Option<NotebookCell> {
    let caps = CELL_START_REGEX.captures(marker)?;
    let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or("");

    let mut id = None;
    let mut kind = None;
    let mut language = None;
    for attr in ATTRIBUTE_REGEX.captures_iter(attributes) {
        let value = unescape_attr(&attr[2]);
        match &attr[1] {
            "id" => id = Some(value),
            "kind" => kind = Some(CellKind::from_attr(&value)?),
            "language" => language = Some(CellLanguage::from_id(&value)),
            other => log::debug!("Ignoring unknown cell attribute '{}'", other),
        }
    }

    let language = language.unwrap_or(CellLanguage::Markdown);
    Some(NotebookCell {
        kind: kind.unwrap_or_else(|| language.default_kind()),
        language,
        content: String::new(),
        id,
    })
}

fn start_marker(cell: &NotebookCell) -> String {
    let mut marker = String::from(CELL_START_PREFIX);
    if let Some(id) = &cell.id {
        marker.push_str(&format!(" id=\"{}\"", escape_attr(id)));
    }
    marker.push_str(&format!(
        " kind=\"{}\" language=\"{}\" {}",
        cell.kind.as_str(),
        escape_attr(cell.language.as_str()),
        MARKER_SUFFIX
    ));
    marker
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn unescape_attr(value: &str) -> String {
    value.replace("&quot;", "\"").replace("&amp;", "&")
}

/// Drops lines that would be read back as cell markers.
fn strip_markers(content: &str) -> String {
    if !content.contains("<!--") {
        return content.to_string();
    }

    content
        .split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            let is_marker = trimmed == CELL_END || trimmed.starts_with(CELL_START_PREFIX);
            if is_marker {
                log::debug!("Dropping cell marker found inside cell content");
            }
            !is_marker
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn flush_loose(loose: &mut Vec<&str>, cells: &mut Vec<NotebookCell>) {
    let text = trim_blank_lines(loose);
    if !text.is_empty() {
        cells.push(NotebookCell::markup(text));
    }
    loose.clear();
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

fn fallback_cell(error: &SerializationError, raw: &str) -> NotebookCell {
    NotebookCell::markup(format!(
        "> **Warning:** this notebook could not be parsed ({}). Its original content is shown below unchanged.\n\n{}",
        error, raw
    ))
}

/// Converts plain `.http`-style text into cells.
///
/// Sections are split at `###` delimiter lines, at request lines, and at
/// markdown header lines that follow a blank line inside a request section.
/// Each section's language is detected from its content:
/// request line → `http`, `# @variables` block → `json`, header or list →
/// `markdown`, parseable JSON → `json`, anything else → `default_language`.
pub fn convert_text_to_notebook(text: &str, default_language: CellLanguage) -> Vec<NotebookCell> {
    let normalized = text.replace("\r\n", "\n");
    let mut sections: Vec<Vec<&str>> = vec![Vec::new()];

    let mut previous_blank = true;
    for line in normalized.split('\n') {
        let trimmed = line.trim();

        if is_section_delimiter(trimmed) {
            sections.push(Vec::new());
            previous_blank = true;
            continue;
        }

        let current = sections.last().map(Vec::as_slice).unwrap_or(&[]);
        let current_has_content = current.iter().any(|l| !l.trim().is_empty());
        let current_is_http = current
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .map(is_request_line)
            .unwrap_or(false);
        let current_is_heading = current
            .iter()
            .all(|l| l.trim().is_empty() || l.trim().starts_with('#'));

        // Comment lines directly above a request belong to it
        let starts_section = if is_request_line(trimmed) {
            current_has_content && !(current_is_heading && !previous_blank)
        } else if MARKDOWN_HEADER_REGEX.is_match(trimmed) {
            current_has_content && current_is_http && previous_blank
        } else {
            false
        };

        if starts_section {
            sections.push(Vec::new());
        }
        if let Some(section) = sections.last_mut() {
            section.push(line);
        }
        previous_blank = trimmed.is_empty();
    }

    sections
        .iter()
        .map(|section| trim_blank_lines(section))
        .filter(|content| !content.is_empty())
        .map(|content| section_to_cell(content, &default_language))
        .collect()
}

fn is_section_delimiter(trimmed: &str) -> bool {
    trimmed.len() >= SECTION_DELIMITER.len() && trimmed.chars().all(|c| c == '#')
}

fn section_to_cell(content: String, default_language: &CellLanguage) -> NotebookCell {
    if let Some(json) = unprefix_variables_block(&content) {
        return NotebookCell::json(json);
    }

    let first_line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or("");

    if is_request_line(first_line) {
        NotebookCell::http(content)
    } else if super::detect::looks_like_markdown(&content) {
        NotebookCell::markup(content)
    } else if looks_like_json(&content) {
        NotebookCell::json(content)
    } else {
        NotebookCell::new(default_language.default_kind(), default_language.clone(), content)
    }
}

fn unprefix_variables_block(content: &str) -> Option<String> {
    let mut lines = content.lines();
    if lines.next()?.trim() != VARIABLES_TAG {
        return None;
    }

    let body: Vec<&str> = lines
        .map(|line| {
            line.strip_prefix("# ")
                .or_else(|| line.strip_prefix('#'))
                .unwrap_or(line)
        })
        .collect();
    Some(body.join("\n"))
}

/// Renders cells as a plain `.http` file.
///
/// HTTP cells are written verbatim, markdown cells as `#` comment blocks and
/// JSON cells as a commented `# @variables` block. Cells of other languages
/// have no representation and are skipped.
pub fn export_to_http_file(cells: &[NotebookCell]) -> String {
    let sections: Vec<String> = cells
        .iter()
        .filter_map(|cell| {
            let content = cell.content.trim_end();
            match cell.language {
                CellLanguage::Http => Some(content.to_string()),
                CellLanguage::Markdown => Some(comment_block(content)),
                CellLanguage::Json => Some(format!("{}\n{}", VARIABLES_TAG, comment_block(content))),
                CellLanguage::Other(ref id) => {
                    log::debug!("Skipping '{}' cell on export", id);
                    None
                }
            }
        })
        .filter(|section| !section.trim().is_empty())
        .collect();

    let mut out = sections.join(&format!("\n\n{}\n\n", SECTION_DELIMITER));
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn comment_block(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.is_empty() {
                "#".to_string()
            } else {
                format!("# {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
