//! Markdown comparison artifacts.
//!
//! One file per environment per group run, named
//! `<timestamp>_<environment>.md`, holding the request that was sent and the
//! response that came back.

use crate::executor::format_duration_ms;
use crate::history::{is_sensitive_header, REDACTED};
use crate::models::{ExecutionResult, ParsedRequest, ResponseData};
use crate::notebook::render::pretty_body;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Attempts at finding a free file name before giving up.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Errors that can occur while writing an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The comparisons directory or the file could not be written.
    #[error("Failed to write artifact {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Every candidate file name was taken.
    #[error("No free artifact file name for '{0}'")]
    NameExhausted(String),
}

/// Turns an environment name into a file name fragment.
///
/// Runs of characters other than ASCII letters, digits, `-` and `_` become a
/// single `-`. An empty result becomes `environment`.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "environment".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name of the artifact for an environment.
pub fn artifact_file_name(timestamp: DateTime<Utc>, environment_name: &str) -> String {
    format!(
        "{}_{}.md",
        timestamp.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
        sanitize_file_name(environment_name)
    )
}

fn redacted(headers: &IndexMap<String, String>) -> impl Iterator<Item = (&String, &str)> {
    headers.iter().map(|(name, value)| {
        if is_sensitive_header(name) {
            (name, REDACTED)
        } else {
            (name, value.as_str())
        }
    })
}

/// Renders the artifact for one environment's execution.
pub fn render_artifact(
    execution_id: &str,
    environment_name: &str,
    timestamp: DateTime<Utc>,
    request: &ParsedRequest,
    result: &ExecutionResult,
) -> String {
    let mut out = format!(
        "# API comparison: {}\n\n- **Execution ID:** `{}`\n- **Environment:** {}\n- **Timestamp:** {}\n",
        environment_name,
        execution_id,
        environment_name,
        timestamp.to_rfc3339()
    );

    out.push_str("\n## Request\n\n```http\n");
    out.push_str(&format!("{} {}\n", request.method, request.url));
    for (name, value) in redacted(&request.headers) {
        out.push_str(&format!("{}: {}\n", name, value));
    }
    if let Some(body) = request.body.as_deref().filter(|b| !b.trim().is_empty()) {
        out.push('\n');
        out.push_str(&pretty_body(body).1);
        out.push('\n');
    }
    out.push_str("```\n");

    out.push_str(&format!(
        "\n## Response\n\n- **Status:** {}\n- **Duration:** {}\n",
        result.status_line(),
        format_duration_ms(result.duration_ms())
    ));

    if let Some(error) = &result.error {
        out.push_str(&format!("- **Error:** {}\n", error));
    }

    if !result.headers.is_empty() {
        out.push_str("\n### Headers\n\n```http\n");
        for (name, value) in redacted(&result.headers) {
            out.push_str(&format!("{}: {}\n", name, value));
        }
        out.push_str("```\n");
    }

    match &result.data {
        Some(ResponseData::Json(value)) => {
            let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            out.push_str(&format!("\n### Body\n\n```json\n{}\n```\n", text));
        }
        Some(ResponseData::Text(text)) if !text.is_empty() => {
            let (language, text) = pretty_body(text);
            out.push_str(&format!("\n### Body\n\n```{}\n{}\n```\n", language, text));
        }
        Some(data @ ResponseData::Binary { .. }) => {
            out.push_str(&format!("\n### Body\n\n_{}_\n", data.to_display_string()));
        }
        _ => {}
    }

    out
}

/// Writes an artifact into `directory`, creating it if needed.
///
/// Existing files are never overwritten: a taken name gets a numeric suffix.
pub async fn write_artifact(
    directory: &Path,
    file_name: &str,
    content: &str,
) -> Result<PathBuf, ArtifactError> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|source| ArtifactError::Io {
            path: directory.to_path_buf(),
            source,
        })?;

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) => (stem, format!(".{}", extension)),
        None => (file_name, String::new()),
    };

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 0 {
            directory.join(file_name)
        } else {
            directory.join(format!("{}-{}{}", stem, attempt, extension))
        };

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await;

        match file {
            Ok(mut file) => {
                let io_error = |source| ArtifactError::Io {
                    path: candidate.clone(),
                    source,
                };
                file.write_all(content.as_bytes()).await.map_err(io_error)?;
                file.flush().await.map_err(io_error)?;
                log::debug!("Wrote comparison artifact {}", candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => {
                return Err(ArtifactError::Io {
                    path: candidate,
                    source,
                })
            }
        }
    }

    Err(ArtifactError::NameExhausted(file_name.to_string()))
}
