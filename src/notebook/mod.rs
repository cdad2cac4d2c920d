//! Notebook documents.
//!
//! A notebook is an ordered list of cells. Markup cells hold documentation;
//! code cells hold HTTP requests, JSON variable definitions or markdown. The
//! cell list is persisted with [`serializer`], executed top to bottom by
//! [`controller::NotebookController`] and generated for an endpoint by
//! [`generator`].

pub mod controller;
pub mod detect;
pub mod generator;
pub mod render;
pub mod serializer;

pub use controller::{CellError, CellExecution, CellOutput, NotebookController};
pub use detect::{looks_like_http, looks_like_json, looks_like_markdown};
pub use generator::create_endpoint_notebook;
pub use serializer::{
    convert_text_to_notebook, deserialize, export_to_http_file, serialize, SerializationError,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a cell is documentation or executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Rendered documentation.
    Markup,
    /// Executable content.
    Code,
}

impl CellKind {
    /// Attribute value used in the document format.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Markup => "markup",
            CellKind::Code => "code",
        }
    }

    /// Parses an attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "markup" => Some(CellKind::Markup),
            "code" => Some(CellKind::Code),
            _ => None,
        }
    }
}

/// Declared language of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CellLanguage {
    /// HTTP request text.
    Http,
    /// Markdown documentation.
    Markdown,
    /// JSON variable definitions.
    Json,
    /// Any other language id.
    Other(String),
}

impl CellLanguage {
    /// Parses a language id. `rest` is accepted as an alias of `http`.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "http" | "rest" => CellLanguage::Http,
            "markdown" | "md" => CellLanguage::Markdown,
            "json" => CellLanguage::Json,
            _ => CellLanguage::Other(id.trim().to_string()),
        }
    }

    /// The language id.
    pub fn as_str(&self) -> &str {
        match self {
            CellLanguage::Http => "http",
            CellLanguage::Markdown => "markdown",
            CellLanguage::Json => "json",
            CellLanguage::Other(id) => id,
        }
    }

    /// Cell kind a cell of this language gets when none is given.
    pub fn default_kind(&self) -> CellKind {
        match self {
            CellLanguage::Markdown => CellKind::Markup,
            _ => CellKind::Code,
        }
    }
}

impl From<String> for CellLanguage {
    fn from(id: String) -> Self {
        CellLanguage::from_id(&id)
    }
}

impl From<CellLanguage> for String {
    fn from(language: CellLanguage) -> Self {
        language.as_str().to_string()
    }
}

impl std::fmt::Display for CellLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookCell {
    /// Markup or code.
    pub kind: CellKind,
    /// Declared language.
    #[serde(rename = "languageId")]
    pub language: CellLanguage,
    /// Raw cell text.
    pub content: String,
    /// Stable identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl NotebookCell {
    /// Creates a cell.
    pub fn new(kind: CellKind, language: CellLanguage, content: impl Into<String>) -> Self {
        Self {
            kind,
            language,
            content: content.into(),
            id: None,
        }
    }

    /// A markdown markup cell.
    pub fn markup(content: impl Into<String>) -> Self {
        Self::new(CellKind::Markup, CellLanguage::Markdown, content)
    }

    /// An HTTP code cell.
    pub fn http(content: impl Into<String>) -> Self {
        Self::new(CellKind::Code, CellLanguage::Http, content)
    }

    /// A JSON variables code cell.
    pub fn json(content: impl Into<String>) -> Self {
        Self::new(CellKind::Code, CellLanguage::Json, content)
    }

    /// Sets the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A notebook: optional document metadata plus cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookDocument {
    /// Free-form metadata stored in the document header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Cells in execution order.
    pub cells: Vec<NotebookCell>,
}

impl NotebookDocument {
    /// Creates a document without metadata.
    pub fn new(cells: Vec<NotebookCell>) -> Self {
        Self { metadata: None, cells }
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
