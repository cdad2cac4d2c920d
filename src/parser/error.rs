//! Error types for request parsing.

use thiserror::Error;

/// Errors raised when request text has no usable request line.
///
/// Each variant carries enough context for the user to find the offending
/// line in the cell or document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The text contains no line that could be a request line.
    #[error("No request line found. Expected a line such as 'GET https://api.example.com/users'")]
    NoRequestLine,

    /// The request line starts with a method outside the whitelist.
    #[error("Invalid HTTP method '{method}' at line {line}. Expected one of: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS, TRACE")]
    InvalidMethod {
        /// The method token as written
        method: String,
        /// Line number in the source text (1-based)
        line: usize,
    },

    /// The request line has a method but no URL.
    #[error("Missing URL in request line '{content}' at line {line}. Expected format: 'METHOD URL'")]
    MissingUrl {
        /// The request line as written
        content: String,
        /// Line number in the source text (1-based)
        line: usize,
    },

    /// The URL did not parse as an absolute URL.
    #[error("Invalid URL '{url}' at line {line}: {reason}")]
    InvalidUrl {
        /// The URL after variable substitution
        url: String,
        /// Line number in the source text (1-based)
        line: usize,
        /// Why the URL was rejected
        reason: String,
    },
}

impl FormatError {
    /// Returns the line number associated with this error, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            FormatError::NoRequestLine => None,
            FormatError::InvalidMethod { line, .. }
            | FormatError::MissingUrl { line, .. }
            | FormatError::InvalidUrl { line, .. } => Some(*line),
        }
    }
}
