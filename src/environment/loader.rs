//! JSON-file backed environment resolver.
//!
//! Loads environments and their credentials from a file such as:
//!
//! ```json
//! {
//!   "environments": [
//!     {
//!       "id": "staging",
//!       "name": "Staging",
//!       "schemaId": "petstore",
//!       "baseUrl": "https://staging.example.com",
//!       "headers": { "X-Env": "staging" },
//!       "auth": { "type": "bearer" },
//!       "credentials": { "apiKey": "..." }
//!     }
//!   ]
//! }
//! ```
//!
//! Credentials are kept in memory only; [`FileResolver::set_credentials`]
//! never writes back to the file.

use super::models::{Credentials, Environment, ResolvedEnvironment};
use super::{CredentialResolver, ResolverError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while loading an environment file.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The file could not be read.
    #[error("Failed to read environment file {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or does not match the expected layout.
    #[error("Failed to parse environment file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two environments share the same id.
    #[error("Duplicate environment id '{0}'")]
    DuplicateId(String),
}

/// Supported environment file names in order of preference
const ENV_FILE_NAMES: &[&str] = &[".api-notebook-env.json", "api-notebook.env.json"];

/// Maximum number of parent directories to search
const MAX_PARENT_SEARCH_DEPTH: usize = 3;

#[derive(Debug, Deserialize)]
struct EnvironmentFile {
    #[serde(default)]
    environments: Vec<FileEnvironment>,
}

#[derive(Debug, Deserialize)]
struct FileEnvironment {
    #[serde(flatten)]
    environment: Environment,
    #[serde(default)]
    credentials: Option<Credentials>,
}

/// Resolver serving environments from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct FileResolver {
    environments: Arc<Vec<Environment>>,
    credentials: Arc<DashMap<String, Credentials>>,
}

impl FileResolver {
    /// Creates a resolver from in-memory records.
    pub fn from_environments(entries: Vec<(Environment, Option<Credentials>)>) -> Self {
        let credentials = DashMap::new();
        let mut environments = Vec::with_capacity(entries.len());

        for (environment, creds) in entries {
            if let Some(creds) = creds {
                credentials.insert(environment.id.clone(), creds);
            }
            environments.push(environment);
        }

        Self {
            environments: Arc::new(environments),
            credentials: Arc::new(credentials),
        }
    }

    /// Parses an environment file's JSON content.
    pub fn from_json(content: &str) -> Result<Self, EnvError> {
        let file: EnvironmentFile = serde_json::from_str(content)?;

        let mut seen = std::collections::HashSet::new();
        for entry in &file.environments {
            if !seen.insert(entry.environment.id.clone()) {
                return Err(EnvError::DuplicateId(entry.environment.id.clone()));
            }
        }

        Ok(Self::from_environments(
            file.environments
                .into_iter()
                .map(|entry| (entry.environment, entry.credentials))
                .collect(),
        ))
    }

    /// Loads an environment file from disk.
    pub fn load(path: &Path) -> Result<Self, EnvError> {
        let content = fs::read_to_string(path).map_err(|source| EnvError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let resolver = Self::from_json(&content)?;
        log::info!(
            "Loaded {} environment(s) from {}",
            resolver.environments.len(),
            path.display()
        );
        Ok(resolver)
    }

    /// Loads the environment file found from `workspace_path`, or an empty
    /// resolver if there is none.
    pub fn load_from_workspace(workspace_path: &Path) -> Result<Self, EnvError> {
        match find_environment_file(workspace_path) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!("No environment file found from {}", workspace_path.display());
                Ok(Self::default())
            }
        }
    }

    /// Returns every loaded environment.
    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    fn find(&self, environment_id: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.id == environment_id)
    }
}

#[async_trait]
impl CredentialResolver for FileResolver {
    async fn resolve_environment_config(
        &self,
        environment_id: &str,
    ) -> Result<Option<ResolvedEnvironment>, ResolverError> {
        Ok(self
            .find(environment_id)
            .cloned()
            .map(ResolvedEnvironment::from_environment))
    }

    async fn get_credentials(
        &self,
        environment: &Environment,
    ) -> Result<Option<Credentials>, ResolverError> {
        Ok(self
            .credentials
            .get(&environment.id)
            .map(|entry| entry.value().clone()))
    }

    async fn set_credentials(
        &self,
        environment: &Environment,
        credentials: Credentials,
    ) -> Result<(), ResolverError> {
        self.credentials.insert(environment.id.clone(), credentials);
        Ok(())
    }

    async fn get_schema_environments(
        &self,
        schema_id: Option<&str>,
    ) -> Result<Vec<Environment>, ResolverError> {
        Ok(self
            .environments
            .iter()
            .filter(|env| match schema_id {
                Some(id) => env.schema_id.as_deref() == Some(id),
                None => true,
            })
            .cloned()
            .collect())
    }
}

/// Finds the environment file by searching the workspace and up to three
/// parent directories.
pub fn find_environment_file(workspace_path: &Path) -> Option<PathBuf> {
    let mut current_path = workspace_path.to_path_buf();

    for _ in 0..=MAX_PARENT_SEARCH_DEPTH {
        for filename in ENV_FILE_NAMES {
            let candidate = current_path.join(filename);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        match current_path.parent() {
            Some(parent) => current_path = parent.to_path_buf(),
            None => break,
        }
    }

    None
}
