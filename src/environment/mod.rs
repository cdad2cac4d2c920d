//! Environment and credential resolution.
//!
//! Environment records, their resolved configuration and their credentials
//! come from an external configuration store. This module defines the
//! contract the executor, runner and group executor consume
//! ([`CredentialResolver`]) and a JSON-file backed implementation
//! ([`FileResolver`]).

pub mod loader;
pub mod models;

pub use loader::{find_environment_file, EnvError, FileResolver};
pub use models::{AuthConfig, AuthKind, Credentials, Environment, ResolvedEnvironment};

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a credential resolver.
///
/// Callers treat any of these as "no configuration" or "no credentials";
/// they never abort a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// The backing store could not be reached or read.
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    /// Access to the secret was refused.
    #[error("Access to credentials for '{0}' was denied")]
    AccessDenied(String),

    /// Any other failure.
    #[error("Failed to resolve environment: {0}")]
    Other(String),
}

/// Resolves environment configuration and credentials.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolves the configuration of one environment.
    ///
    /// Returns `Ok(None)` when no environment has that id.
    async fn resolve_environment_config(
        &self,
        environment_id: &str,
    ) -> Result<Option<ResolvedEnvironment>, ResolverError>;

    /// Fetches the credentials stored for an environment.
    async fn get_credentials(
        &self,
        environment: &Environment,
    ) -> Result<Option<Credentials>, ResolverError>;

    /// Stores credentials for an environment.
    async fn set_credentials(
        &self,
        environment: &Environment,
        credentials: Credentials,
    ) -> Result<(), ResolverError>;

    /// Lists the environments of a schema, or every environment when
    /// `schema_id` is `None`.
    async fn get_schema_environments(
        &self,
        schema_id: Option<&str>,
    ) -> Result<Vec<Environment>, ResolverError>;
}
