//! HTTP request notebooks.
//!
//! This crate runs API requests written as notebook cells, compares one
//! request across several environments and keeps credentials out of the
//! documents it generates.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **parser**: Parses request text (`METHOD URL`, headers, body) after
//!   `{{variable}}` substitution
//! - **variables**: The per-notebook variable context and response extraction
//! - **executor**: Sends requests, synthesizes authentication and decodes responses
//! - **notebook**: The cell model, the notebook file format, the controller
//!   that runs cells, and notebook generation for an endpoint
//! - **group**: Replays a captured request across environments and writes
//!   Markdown comparison artifacts
//! - **secrets**: The document-scoped secret store and masked rendering
//! - **runner**: Request documents with masked credentials
//! - **environment**: Environment records and the credential resolver contract
//! - **history**: Executed request records and their on-disk log
//! - **config**: Process-wide settings
//!
//! # Example
//!
//! ```no_run
//! use api_notebook::executor::{ExecutionConfig, RequestExecutor};
//! use api_notebook::notebook::{deserialize, NotebookController};
//! use api_notebook::secrets::SecretStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RequestExecutor::with_reqwest(ExecutionConfig::default(), SecretStore::default())?;
//! let mut controller = NotebookController::new(Arc::new(executor));
//!
//! let document = deserialize(&std::fs::read("users.apinb")?);
//! for execution in controller.execute_all(&document.cells).await {
//!     println!("cell {}: success={}", execution.index, execution.success);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoint;
pub mod environment;
pub mod executor;
pub mod group;
pub mod history;
pub mod models;
pub mod notebook;
pub mod parser;
pub mod runner;
pub mod secrets;
pub mod variables;

pub use executor::RequestExecutor;
pub use models::{ExecutionResult, HttpMethod, ParsedRequest};
pub use notebook::{NotebookCell, NotebookController, NotebookDocument};
pub use parser::parse_request;
pub use variables::VariableContext;
