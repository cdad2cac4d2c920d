//! Notebook execution.
//!
//! A [`NotebookController`] owns the variable context of one open notebook
//! and runs cells strictly in the order it is given, awaiting each cell to
//! completion before starting the next. A failing cell never stops the
//! cells after it.

use super::detect::{looks_like_http, looks_like_json, looks_like_markdown};
use super::render::{render_request_details, render_response, structured_output};
use super::{CellKind, CellLanguage, NotebookCell};
use crate::executor::{RequestExecutor, Stopwatch};
use crate::history::{save_entry, HistoryConfig, HistoryEntry};
use crate::parser::{parse_request, FormatError};
use crate::variables::{ExtractionRules, VariableContext, VariableError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Why a cell failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// The request text could not be parsed.
    #[error("{0}")]
    Format(#[from] FormatError),

    /// A JSON cell did not hold a JSON object.
    #[error("{0}")]
    Variables(#[from] VariableError),

    /// The request never got a response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The cell language cannot be executed.
    #[error("{}", unsupported_message(.language, .suggestion))]
    UnsupportedLanguage {
        /// Declared language
        language: String,
        /// Language the content looks like, if any
        suggestion: Option<CellLanguage>,
    },
}

impl CellError {
    /// Short error name shown in the output.
    pub fn name(&self) -> &'static str {
        match self {
            CellError::Format(_) => "FormatError",
            CellError::Variables(_) => "InvalidJson",
            CellError::Transport(_) => "TransportError",
            CellError::UnsupportedLanguage { .. } => "UnsupportedCellError",
        }
    }
}

fn unsupported_message(language: &str, suggestion: &Option<CellLanguage>) -> String {
    match suggestion {
        Some(suggested) => {
            let looks_like = match suggested {
                CellLanguage::Http => "an HTTP request",
                CellLanguage::Json => "JSON variables",
                _ => "markdown",
            };
            format!(
                "Cell language '{}' is not supported. This cell looks like {}; change the cell language to '{}' to run it.",
                language, looks_like, suggested
            )
        }
        None => format!(
            "Cell language '{}' is not supported. Use 'http' for HTTP requests, 'json' for variable definitions or 'markdown' for documentation.",
            language
        ),
    }
}

/// One renderable output of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellOutput {
    /// Markdown text.
    Markdown(String),
    /// Structured JSON.
    Json(Value),
    /// Plain text.
    Text(String),
    /// An error.
    Error {
        /// Error name
        name: String,
        /// Message shown to the user
        message: String,
    },
}

impl CellOutput {
    fn from_error(error: &CellError) -> Self {
        CellOutput::Error {
            name: error.name().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of running one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellExecution {
    /// Index of the cell in the notebook.
    pub index: usize,
    /// Id of the cell, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    /// Whether the cell succeeded.
    pub success: bool,
    /// Outputs to render.
    pub outputs: Vec<CellOutput>,
    /// Time spent executing the cell.
    pub duration_ms: u64,
}

/// Executes notebook cells for one open document.
pub struct NotebookController {
    executor: Arc<RequestExecutor>,
    variables: VariableContext,
    extraction: ExtractionRules,
    history: Vec<HistoryEntry>,
    history_file: Option<PathBuf>,
    document_uri: Option<String>,
    environment_id: Option<String>,
    schema_id: Option<String>,
}

impl NotebookController {
    /// Creates a controller with an empty variable context.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            variables: VariableContext::new(),
            extraction: ExtractionRules::from_global_config(),
            history: Vec::new(),
            history_file: None,
            document_uri: None,
            environment_id: None,
            schema_id: None,
        }
    }

    /// Sets the URI of the notebook document.
    pub fn with_document(mut self, uri: impl Into<String>) -> Self {
        self.document_uri = Some(uri.into());
        self
    }

    /// Runs HTTP cells against an environment.
    pub fn with_environment(mut self, environment_id: impl Into<String>, schema_id: Option<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self.schema_id = schema_id;
        self
    }

    /// Replaces the response extraction rules.
    pub fn with_extraction(mut self, rules: ExtractionRules) -> Self {
        self.extraction = rules;
        self
    }

    /// Appends every history entry to a JSONL file.
    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }

    /// Current variables.
    pub fn variables(&self) -> &VariableContext {
        &self.variables
    }

    /// Mutable access to the variables, e.g. to seed them.
    pub fn variables_mut(&mut self) -> &mut VariableContext {
        &mut self.variables
    }

    /// Clears every variable. Only done on explicit user request.
    pub fn reset_variables(&mut self) {
        self.variables.clear();
    }

    /// Requests executed in this session, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Runs every cell in order.
    pub async fn execute_all(&mut self, cells: &[NotebookCell]) -> Vec<CellExecution> {
        let order: Vec<usize> = (0..cells.len()).collect();
        self.execute_cells(cells, &order).await
    }

    /// Runs the cells at `order`, in exactly that order.
    ///
    /// Indices outside `cells` are skipped.
    pub async fn execute_cells(&mut self, cells: &[NotebookCell], order: &[usize]) -> Vec<CellExecution> {
        let mut executions = Vec::with_capacity(order.len());
        for &index in order {
            match cells.get(index) {
                Some(cell) => executions.push(self.execute_cell(index, cell).await),
                None => log::warn!("Skipping cell index {} outside a notebook of {} cells", index, cells.len()),
            }
        }
        executions
    }

    /// Runs the cells before `index` in order, then the cell at `index` alone,
    /// and returns that cell's execution with the request it sent.
    ///
    /// The entry is `None` unless the cell succeeded and recorded exactly one
    /// request, so a cell that failed to parse never yields an earlier cell's
    /// request. Returns `None` when `index` is outside `cells`.
    pub async fn capture_request(
        &mut self,
        cells: &[NotebookCell],
        index: usize,
    ) -> Option<(CellExecution, Option<HistoryEntry>)> {
        let cell = cells.get(index)?;

        let setup: Vec<usize> = (0..index).collect();
        self.execute_cells(cells, &setup).await;

        let recorded = self.history.len();
        let execution = self.execute_cell(index, cell).await;
        let entry = if execution.success && self.history.len() == recorded + 1 {
            self.history.last().cloned()
        } else {
            None
        };

        Some((execution, entry))
    }

    /// Runs one cell.
    pub async fn execute_cell(&mut self, index: usize, cell: &NotebookCell) -> CellExecution {
        let stopwatch = Stopwatch::start();

        let (success, outputs) = if cell.kind == CellKind::Markup {
            (true, Vec::new())
        } else {
            match &cell.language {
                CellLanguage::Markdown => (true, Vec::new()),
                CellLanguage::Json => self.execute_json(&cell.content),
                CellLanguage::Http => self.execute_http(&cell.content).await,
                CellLanguage::Other(language) => {
                    let error = unsupported_language(language, &cell.content);
                    (false, vec![CellOutput::from_error(&error)])
                }
            }
        };

        CellExecution {
            index,
            cell_id: cell.id.clone(),
            success,
            outputs,
            duration_ms: stopwatch.elapsed_ms(),
        }
    }

    fn execute_json(&mut self, content: &str) -> (bool, Vec<CellOutput>) {
        match self.variables.merge_json(content) {
            Ok(keys) => {
                let message = if keys.is_empty() {
                    "No variables defined".to_string()
                } else {
                    format!("Variables updated: {}", keys.join(", "))
                };
                (true, vec![CellOutput::Text(message)])
            }
            Err(e) => (false, vec![CellOutput::from_error(&CellError::from(e))]),
        }
    }

    async fn execute_http(&mut self, content: &str) -> (bool, Vec<CellOutput>) {
        let mut request = match parse_request(content, &self.variables) {
            Ok(request) => request,
            Err(e) => return (false, vec![CellOutput::from_error(&CellError::from(e))]),
        };
        request.environment_id = self.environment_id.clone();
        request.document_uri = self.document_uri.clone();

        let result = self.executor.execute(&request).await;
        self.record_history(HistoryEntry::new(request.clone(), &result, self.variables.snapshot()));

        let details = CellOutput::Markdown(render_request_details(&request));

        if let Some(error) = result.error.clone().filter(|_| result.is_transport_failure()) {
            let error = CellError::Transport(error);
            return (false, vec![details, CellOutput::from_error(&error)]);
        }

        if result.success {
            if let Some(body) = result.json_body() {
                let written = self.extraction.apply(body, &mut self.variables);
                if !written.is_empty() {
                    log::debug!("Response set variables: {}", written.join(", "));
                }
            }
        }

        (
            true,
            vec![
                details,
                CellOutput::Markdown(render_response(&result)),
                CellOutput::Json(structured_output(&request, &result)),
            ],
        )
    }

    fn record_history(&mut self, entry: HistoryEntry) {
        let entry = entry.with_schema(self.schema_id.clone());
        if let Some(path) = &self.history_file {
            if let Err(e) = save_entry(path, &entry, &HistoryConfig::from_global_config()) {
                log::warn!("Failed to save history entry: {}", e);
            }
        }
        self.history.push(entry);
    }
}

/// Builds the error for a cell whose language cannot run, suggesting a
/// language when the content gives it away.
fn unsupported_language(language: &str, content: &str) -> CellError {
    let suggestion = if looks_like_http(content) {
        Some(CellLanguage::Http)
    } else if looks_like_json(content) {
        Some(CellLanguage::Json)
    } else if looks_like_markdown(content) {
        Some(CellLanguage::Markdown)
    } else {
        None
    };

    CellError::UnsupportedLanguage {
        language: language.to_string(),
        suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::MockTransport;
    use crate::executor::{ExecutionConfig, TransportResponse};
    use crate::secrets::SecretStore;
    use indexmap::IndexMap;
    use serde_json::json;

    fn controller(transport: Arc<MockTransport>) -> NotebookController {
        let executor = RequestExecutor::new(transport, SecretStore::new(4)).with_config(ExecutionConfig::new(5000));
        let mut aliases = IndexMap::new();
        aliases.insert("token".to_string(), "authToken".to_string());
        NotebookController::new(Arc::new(executor)).with_extraction(ExtractionRules::new(aliases))
    }

    fn error_message(execution: &CellExecution) -> String {
        execution
            .outputs
            .iter()
            .find_map(|output| match output {
                CellOutput::Error { message, .. } => Some(message.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_markup_and_json_cells() {
        let mut controller = controller(Arc::new(MockTransport::json(200, json!({}))));
        let cells = vec![
            NotebookCell::markup("# Title"),
            NotebookCell::json(r#"{"baseUrl": "https://api.test", "n": 1}"#),
        ];

        let executions = controller.execute_all(&cells).await;
        assert!(executions.iter().all(|e| e.success));
        assert!(executions[0].outputs.is_empty());
        assert_eq!(
            executions[1].outputs,
            vec![CellOutput::Text("Variables updated: baseUrl, n".to_string())]
        );
        assert_eq!(controller.variables().get("n"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_invalid_json_leaves_variables_untouched() {
        let mut controller = controller(Arc::new(MockTransport::json(200, json!({}))));
        controller.variables_mut().set("keep", "me");

        let execution = controller.execute_cell(0, &NotebookCell::json("{broken")).await;
        assert!(!execution.success);
        assert!(error_message(&execution).starts_with("Invalid JSON"));
        assert_eq!(controller.variables().len(), 1);

        let execution = controller.execute_cell(0, &NotebookCell::json("[1]")).await;
        assert!(!execution.success);
        assert!(error_message(&execution).starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_http_response_flows_into_next_cell() {
        let transport = Arc::new(MockTransport::new(|request| {
            if request.url.ends_with("/login") {
                Ok(TransportResponse::new(200, r#"{"token": "abc123"}"#)
                    .with_header("Content-Type", "application/json"))
            } else {
                Ok(TransportResponse::new(200, "ok").with_header("Content-Type", "text/plain"))
            }
        }));
        let mut controller = controller(transport.clone());

        let cells = vec![
            NotebookCell::json(r#"{"baseUrl": "https://api.test"}"#),
            NotebookCell::http("POST {{baseUrl}}/login\nContent-Type: application/json\n\n{\"user\": \"u\"}"),
            NotebookCell::http("GET {{baseUrl}}/me\nAuthorization: Bearer {{authToken}}\nX-Raw: {{token}}"),
        ];
        let executions = controller.execute_all(&cells).await;

        assert!(executions.iter().all(|e| e.success));
        assert_eq!(executions[1].outputs.len(), 3);

        let sent = transport.last_request();
        assert_eq!(sent.url, "https://api.test/me");
        assert_eq!(sent.header("Authorization"), Some("Bearer abc123"));
        assert_eq!(sent.header("X-Raw"), Some("abc123"));
        assert_eq!(controller.history().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let mut controller = controller(Arc::new(MockTransport::failing("connection refused")));
        let cells = vec![
            NotebookCell::http("FOO https://api.test"),
            NotebookCell::http("GET https://api.test/down"),
            NotebookCell::json(r#"{"after": true}"#),
        ];

        let executions = controller.execute_all(&cells).await;
        assert_eq!(executions.len(), 3);
        assert!(!executions[0].success);
        assert!(error_message(&executions[0]).contains("FOO"));
        assert!(!executions[1].success);
        assert!(error_message(&executions[1]).contains("connection refused"));
        assert!(executions[2].success);
        assert_eq!(controller.variables().get("after"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_http_error_status_is_rendered_not_failed() {
        let mut controller = controller(Arc::new(MockTransport::json(404, json!({"token": "nope"}))));
        let execution = controller
            .execute_cell(0, &NotebookCell::http("GET https://api.test/missing"))
            .await;

        assert!(execution.success);
        assert!(matches!(&execution.outputs[1], CellOutput::Markdown(text) if text.contains("404 Not Found")));
        assert!(controller.variables().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_language_guidance() {
        let mut controller = controller(Arc::new(MockTransport::json(200, json!({}))));
        let python = CellLanguage::Other("python".to_string());

        let cells = vec![
            NotebookCell::new(CellKind::Code, python.clone(), "GET https://api.test"),
            NotebookCell::new(CellKind::Code, python.clone(), r#"{"a": 1}"#),
            NotebookCell::new(CellKind::Code, python.clone(), "## Notes"),
            NotebookCell::new(CellKind::Code, python, "print('hi')"),
        ];
        let executions = controller.execute_all(&cells).await;

        assert!(executions.iter().all(|e| !e.success));
        assert!(error_message(&executions[0]).contains("change the cell language to 'http'"));
        assert!(error_message(&executions[1]).contains("change the cell language to 'json'"));
        assert!(error_message(&executions[2]).contains("change the cell language to 'markdown'"));
        let generic = error_message(&executions[3]);
        assert!(generic.contains("'http'") && generic.contains("'json'") && generic.contains("'markdown'"));
    }

    #[tokio::test]
    async fn test_execute_cells_respects_given_order() {
        let mut controller = controller(Arc::new(MockTransport::json(200, json!({}))));
        let cells = vec![NotebookCell::json(r#"{"v": 1}"#), NotebookCell::json(r#"{"v": 2}"#)];

        let executions = controller.execute_cells(&cells, &[1, 0, 7]).await;
        assert_eq!(executions.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(controller.variables().get("v"), Some(&json!(1)));

        controller.reset_variables();
        assert!(controller.variables().is_empty());
    }

    #[tokio::test]
    async fn test_capture_request_returns_the_cell_request() {
        let transport = Arc::new(MockTransport::json(200, json!({"id": 9})));
        let mut controller = controller(transport.clone());
        let cells = vec![
            NotebookCell::json(r#"{"baseUrl": "https://api.test"}"#),
            NotebookCell::http("GET {{baseUrl}}/first"),
            NotebookCell::http("GET {{baseUrl}}/second"),
        ];

        let (execution, entry) = controller.capture_request(&cells, 2).await.unwrap();
        assert!(execution.success);
        assert_eq!(execution.index, 2);
        assert_eq!(entry.unwrap().request.url, "https://api.test/second");
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_capture_request_ignores_earlier_requests_when_cell_fails() {
        let mut controller = controller(Arc::new(MockTransport::json(200, json!({}))));
        let cells = vec![
            NotebookCell::http("GET https://a.test/x"),
            NotebookCell::http("FOO bar"),
        ];

        let (execution, entry) = controller.capture_request(&cells, 1).await.unwrap();
        assert!(!execution.success);
        assert!(entry.is_none());
        assert_eq!(controller.history().len(), 1);

        assert!(controller.capture_request(&cells, 5).await.is_none());
    }

    #[tokio::test]
    async fn test_history_file_is_redacted() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut controller = controller(Arc::new(MockTransport::json(200, json!({})))).with_history_file(&path);

        controller
            .execute_cell(0, &NotebookCell::http("GET https://api.test\nAuthorization: Bearer topsecret"))
            .await;

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("topsecret"));
        assert_eq!(controller.history()[0].request.header("Authorization"), Some("Bearer topsecret"));
    }
}
