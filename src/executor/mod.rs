//! HTTP request executor.
//!
//! [`RequestExecutor::execute`] turns a [`ParsedRequest`] into an
//! [`ExecutionResult`] and never fails: transport errors are reported as a
//! result with status 0.
//!
//! Header precedence, lowest first:
//!
//! 1. configured default headers
//! 2. headers resolved for the request's environment
//! 3. the synthesized authentication header
//! 4. headers written in the request itself
//!
//! Authentication is best-effort. When the environment or its credentials
//! cannot be resolved the failure is logged and the request goes out
//! without authentication.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod timing;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{encode_basic, synthesize_auth_header};
pub use config::ExecutionConfig;
pub use content::{classify, decode_body, ContentCategory};
pub use error::RequestError;
pub use timing::{format_duration_ms, Stopwatch};
pub use transport::{HttpTransport, OutgoingRequest, ReqwestTransport, TransportResponse};

use crate::environment::{CredentialResolver, ResolvedEnvironment};
use crate::models::{insert_header, ExecutionResult, ParsedRequest};
use crate::secrets::{is_masked, SecretStore};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

/// Executes parsed requests against the network.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    resolver: Option<Arc<dyn CredentialResolver>>,
    secrets: SecretStore,
    config: ExecutionConfig,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("has_resolver", &self.resolver.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl RequestExecutor {
    /// Creates an executor over `transport` using the global configuration.
    pub fn new(transport: Arc<dyn HttpTransport>, secrets: SecretStore) -> Self {
        Self {
            transport,
            resolver: None,
            secrets,
            config: ExecutionConfig::from_global_config(),
        }
    }

    /// Creates an executor using the reqwest transport built from `config`.
    pub fn with_reqwest(config: ExecutionConfig, secrets: SecretStore) -> Result<Self, RequestError> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            resolver: None,
            secrets,
            config,
        })
    }

    /// Sets the resolver used for environment configuration and credentials.
    pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replaces the execution configuration.
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// The document-scoped secret store.
    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    /// The credential resolver, if one is configured.
    pub fn resolver(&self) -> Option<&Arc<dyn CredentialResolver>> {
        self.resolver.as_ref()
    }

    /// The execution configuration.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Executes a request.
    ///
    /// HTTP error statuses produce `success == false` without an error
    /// message; network failures produce status 0 with the message in
    /// `error`.
    pub async fn execute(&self, request: &ParsedRequest) -> ExecutionResult {
        let outgoing = self.prepare(request).await;
        let url = outgoing.url.clone();

        let stopwatch = Stopwatch::start();
        match self.transport.send(outgoing).await {
            Ok(response) => {
                let timing = stopwatch.finish();
                let content_type = response.headers.get("content-type").map(String::as_str);
                let data = decode_body(content_type, &response.body);
                log::debug!(
                    "{} {} -> {} in {} ms",
                    request.method,
                    url,
                    response.status,
                    timing.duration_ms()
                );
                ExecutionResult::from_response(
                    response.status,
                    response.status_text,
                    response.headers,
                    data,
                    timing,
                )
            }
            Err(e) => {
                log::warn!("{} {} failed: {}", request.method, url, e);
                ExecutionResult::transport_failure(e.to_string(), stopwatch.finish())
            }
        }
    }

    /// Resolves the final header set, body and timeout for a request.
    pub async fn prepare(&self, request: &ParsedRequest) -> OutgoingRequest {
        let mut headers = self.config.default_headers.clone();
        let mut timeout = self.config.timeout_duration();
        let mut auth_header = None;

        if let Some(resolved) = self.resolve_environment(request).await {
            for (name, value) in &resolved.resolved_headers {
                insert_header(&mut headers, name, value);
            }
            if let Some(ms) = resolved.resolved_timeout.filter(|ms| *ms > 0) {
                timeout = Duration::from_millis(ms);
            }
            auth_header = self.resolve_auth_header(&resolved).await;
            if let Some((name, value)) = &auth_header {
                insert_header(&mut headers, name, value);
            }
        }

        let mut request_headers = request.headers.clone();
        if let Some(uri) = &request.document_uri {
            self.secrets.unmask_headers(uri, &mut request_headers);
        }

        for (name, value) in &request_headers {
            let shadows_auth = auth_header
                .as_ref()
                .map(|(auth_name, _)| auth_name.eq_ignore_ascii_case(name))
                .unwrap_or(false);
            if shadows_auth && is_masked(value) {
                log::debug!("Keeping resolved credentials for masked header '{}'", name);
                continue;
            }
            insert_header(&mut headers, name, value);
        }

        OutgoingRequest {
            method: request.method,
            url: request.url.clone(),
            headers,
            body: if request.method.sends_body() {
                request.body.clone()
            } else {
                None
            },
            timeout,
        }
    }

    async fn resolve_environment(&self, request: &ParsedRequest) -> Option<ResolvedEnvironment> {
        let environment_id = request.environment_id.as_deref()?;
        let resolver = self.resolver.as_ref()?;

        match resolver.resolve_environment_config(environment_id).await {
            Ok(Some(resolved)) => Some(resolved),
            Ok(None) => {
                log::warn!(
                    "Environment '{}' not found, sending request without environment settings",
                    environment_id
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "Failed to resolve environment '{}': {}. Sending request unauthenticated",
                    environment_id,
                    e
                );
                None
            }
        }
    }

    async fn resolve_auth_header(&self, resolved: &ResolvedEnvironment) -> Option<(String, String)> {
        let auth = resolved.resolved_auth.as_ref()?;
        let resolver = self.resolver.as_ref()?;

        match resolver.get_credentials(&resolved.environment).await {
            Ok(Some(credentials)) => synthesize_auth_header(auth, &credentials),
            Ok(None) => {
                log::debug!("No credentials stored for environment '{}'", resolved.environment.id);
                None
            }
            Err(e) => {
                log::warn!(
                    "Failed to read credentials for environment '{}': {}. Sending request unauthenticated",
                    resolved.environment.id,
                    e
                );
                None
            }
        }
    }
}

/// Builds the header map of an environment merged over `base`.
///
/// Used where a request is assembled outside the parser, e.g. when a
/// template is replayed.
pub fn merge_headers(
    base: &IndexMap<String, String>,
    overrides: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut merged = base.clone();
    for (name, value) in overrides {
        insert_header(&mut merged, name, value);
    }
    merged
}
