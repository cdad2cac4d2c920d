//! Plain request documents for an endpoint.
//!
//! [`HttpRunner`] writes a single-request document for an endpoint against a
//! resolved environment. Secret-derived headers appear in the document only in
//! masked form; the real values go into the executor's [`SecretStore`] under
//! the document URI and are substituted back when the document is executed.
//!
//! [`SecretStore`]: crate::secrets::SecretStore

use crate::endpoint::Endpoint;
use crate::environment::ResolverError;
use crate::executor::{synthesize_auth_header, RequestExecutor};
use crate::models::ExecutionResult;
use crate::parser::{parse_request, FormatError};
use crate::secrets::{SecretError, Visibility};
use crate::variables::VariableContext;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// No environment with the given id exists.
    #[error("Environment '{0}' not found")]
    EnvironmentNotFound(String),

    /// The executor has no credential resolver to look environments up with.
    #[error("No credential resolver is configured")]
    NoResolver,

    /// The resolver failed.
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// A secret store operation failed.
    #[error(transparent)]
    Secret(#[from] SecretError),
}

/// A generated request document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDocument {
    /// URI the document's secrets are stored under.
    pub uri: String,
    /// Document text, secrets masked.
    pub text: String,
}

/// Creates, toggles and executes request documents.
#[derive(Debug, Clone)]
pub struct HttpRunner {
    executor: Arc<RequestExecutor>,
}

impl HttpRunner {
    /// Creates a runner. Secrets are kept in the executor's secret store.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// The executor requests are sent with.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Writes the request document for `endpoint` in `environment_id`.
    ///
    /// Credentials are best-effort: when they cannot be read the document is
    /// created without an authentication header.
    pub async fn create_request_document(
        &self,
        endpoint: &Endpoint,
        environment_id: &str,
        uri: &str,
    ) -> Result<RequestDocument, RunnerError> {
        let resolver = self.executor.resolver().ok_or(RunnerError::NoResolver)?;
        let resolved = resolver
            .resolve_environment_config(environment_id)
            .await?
            .ok_or_else(|| RunnerError::EnvironmentNotFound(environment_id.to_string()))?;
        let environment = &resolved.environment;

        let credentials = match resolver.get_credentials(environment).await {
            Ok(credentials) => credentials,
            Err(e) => {
                log::warn!(
                    "Failed to read credentials for environment '{}': {}. Creating document without authentication",
                    environment.id,
                    e
                );
                None
            }
        };
        let auth_header = resolved
            .resolved_auth
            .as_ref()
            .zip(credentials.as_ref())
            .and_then(|(auth, credentials)| synthesize_auth_header(auth, credentials));

        let mut lines = vec![
            format!("# {}", endpoint.title()),
            format!("# Environment: {}", environment.name),
            String::new(),
            format!(
                "{} {}{}",
                endpoint.method,
                environment.trimmed_base_url(),
                endpoint.templated_path()
            ),
            "Accept: application/json".to_string(),
        ];

        for (name, value) in &resolved.resolved_headers {
            let shadowed = auth_header
                .as_ref()
                .map(|(auth_name, _)| auth_name.eq_ignore_ascii_case(name))
                .unwrap_or(false);
            if !shadowed {
                lines.push(format!("{}: {}", name, value));
            }
        }

        let secrets = self.executor.secrets();
        if let Some((name, value)) = auth_header {
            secrets.put(uri, &name, value);
            if let Some(line) = secrets.masked_line(uri, &name) {
                lines.push(line);
            }
        }

        if endpoint.method.sends_body() {
            lines.push("Content-Type: application/json".to_string());
            lines.push(String::new());
            let body = endpoint
                .request_body
                .as_ref()
                .and_then(|body| serde_json::to_string_pretty(body).ok())
                .unwrap_or_else(|| "{}".to_string());
            lines.push(body);
        }

        log::debug!("Created request document {} for environment '{}'", uri, environment.id);

        Ok(RequestDocument {
            uri: uri.to_string(),
            text: lines.join("\n"),
        })
    }

    /// Flips the document between masked and revealed secrets.
    ///
    /// The returned text is for display; save [`HttpRunner::persistable_text`]
    /// instead.
    pub fn toggle_visibility(&self, uri: &str, text: &str) -> Result<(String, Visibility), RunnerError> {
        Ok(self.executor.secrets().toggle_visibility(uri, text)?)
    }

    /// The document text safe to write to disk, whatever its current
    /// visibility.
    pub fn persistable_text(&self, uri: &str, text: &str) -> String {
        self.executor.secrets().mask_document(uri, text)
    }

    /// Parses and executes a request document.
    ///
    /// Masked and revealed documents send the same header values.
    pub async fn execute_document(
        &self,
        uri: &str,
        text: &str,
        variables: &VariableContext,
    ) -> Result<ExecutionResult, FormatError> {
        let request = parse_request(text, variables)?.with_document(uri);
        Ok(self.executor.execute(&request).await)
    }

    /// Releases the secrets of a closed document.
    pub fn close_document(&self, uri: &str) -> bool {
        self.executor.secrets().remove_document(uri)
    }
}
