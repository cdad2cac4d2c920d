//! Replaying one request across several environments.
//!
//! [`GroupExecutor::execute_across_environments`] runs a [`RequestTemplate`]
//! against each target environment in turn, writes one comparison artifact per
//! environment and aggregates the outcomes. A failing environment is recorded
//! and the run moves on; a group run itself never fails.

pub mod artifact;
pub mod template;

pub use artifact::{artifact_file_name, render_artifact, sanitize_file_name, write_artifact, ArtifactError};
pub use template::{build_url, extract_relative_path, RequestTemplate};

use crate::config::get_config;
use crate::environment::ResolvedEnvironment;
use crate::executor::RequestExecutor;
use crate::models::{ExecutionResult, Timing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress callback: `(current, total, environment_name)`, `current` from 1.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(usize, usize, &str) + Send);

/// Overall outcome of a group run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    /// Every environment succeeded.
    Success,
    /// No environment succeeded.
    Failed,
    /// Some environments succeeded.
    Partial,
}

impl GroupStatus {
    /// Classifies a run from its success and failure counts.
    pub fn from_counts(successful: usize, failed: usize) -> Self {
        if failed == 0 {
            GroupStatus::Success
        } else if successful == 0 {
            GroupStatus::Failed
        } else {
            GroupStatus::Partial
        }
    }
}

/// Outcome for one target environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentExecution {
    /// Environment id.
    pub environment_id: String,
    /// Environment display name, or the id when it could not be resolved.
    pub environment_name: String,
    /// Execution result; a synthetic status 0 result when the environment
    /// could not be run or its artifact could not be written.
    pub result: ExecutionResult,
    /// Path of the comparison artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnvironmentExecution {
    /// Whether this environment counts as a success.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.result.success
    }

    fn failed(environment_id: &str, environment_name: &str, message: String) -> Self {
        Self {
            environment_id: environment_id.to_string(),
            environment_name: environment_name.to_string(),
            result: ExecutionResult::transport_failure(message.clone(), Timing::default()),
            artifact: None,
            error: Some(message),
        }
    }
}

/// Counts for a group run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Number of target environments.
    pub total_environments: usize,
    /// Environments that succeeded.
    pub successful_executions: usize,
    /// Environments that failed.
    pub failed_executions: usize,
    /// Wall-clock duration of the whole run in milliseconds.
    pub total_duration: u64,
}

/// Result of a group run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupExecutionResult {
    /// Run id, also written into every artifact.
    pub id: String,
    /// The replayed template.
    pub template: RequestTemplate,
    /// One entry per target environment, in target order.
    pub results: Vec<EnvironmentExecution>,
    /// Counts.
    pub summary: GroupSummary,
    /// Overall status.
    pub status: GroupStatus,
    /// Start of the run.
    pub started_at: DateTime<Utc>,
    /// End of the run.
    pub completed_at: DateTime<Utc>,
}

/// Runs request templates across environments.
#[derive(Debug, Clone)]
pub struct GroupExecutor {
    executor: Arc<RequestExecutor>,
    comparisons_dir: PathBuf,
}

impl GroupExecutor {
    /// Creates a group executor writing artifacts to the configured
    /// comparisons directory under `workspace_root`.
    pub fn new(executor: Arc<RequestExecutor>, workspace_root: &Path) -> Self {
        Self {
            executor,
            comparisons_dir: workspace_root.join(get_config().comparisons_dir),
        }
    }

    /// Overrides the artifact directory.
    pub fn with_comparisons_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.comparisons_dir = directory.into();
        self
    }

    /// Directory artifacts are written to.
    pub fn comparisons_dir(&self) -> &Path {
        &self.comparisons_dir
    }

    /// Replays `template` against every environment in `environment_ids`,
    /// one after the other.
    pub async fn execute_across_environments(
        &self,
        template: &RequestTemplate,
        environment_ids: &[String],
        mut progress: Option<ProgressCallback<'_>>,
    ) -> GroupExecutionResult {
        let id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let total = environment_ids.len();
        let mut results = Vec::with_capacity(total);

        log::info!(
            "Group run {}: {} {} across {} environment(s)",
            id,
            template.method,
            template.path,
            total
        );

        for (index, environment_id) in environment_ids.iter().enumerate() {
            let resolved = self.resolve(environment_id).await;
            let name = resolved
                .as_ref()
                .map(|r| r.environment.name.as_str())
                .unwrap_or(environment_id);

            if let Some(callback) = progress.as_deref_mut() {
                callback(index + 1, total, name);
            }

            let entry = match &resolved {
                Some(resolved) => self.execute_one(&id, template, resolved).await,
                None => EnvironmentExecution::failed(
                    environment_id,
                    environment_id,
                    format!("Environment '{}' could not be resolved", environment_id),
                ),
            };

            if let Some(error) = &entry.error {
                log::warn!("Group run {}: environment '{}' failed: {}", id, entry.environment_name, error);
            }
            results.push(entry);
        }

        let completed_at = Utc::now();
        let successful = results.iter().filter(|r| r.succeeded()).count();
        let failed = results.len() - successful;
        let summary = GroupSummary {
            total_environments: total,
            successful_executions: successful,
            failed_executions: failed,
            total_duration: (completed_at - started_at).num_milliseconds().max(0) as u64,
        };
        let status = GroupStatus::from_counts(successful, failed);

        log::info!(
            "Group run {} finished: {} succeeded, {} failed",
            id,
            successful,
            failed
        );

        GroupExecutionResult {
            id,
            template: template.clone(),
            results,
            summary,
            status,
            started_at,
            completed_at,
        }
    }

    async fn resolve(&self, environment_id: &str) -> Option<ResolvedEnvironment> {
        let Some(resolver) = self.executor.resolver() else {
            log::warn!("No credential resolver configured, cannot resolve '{}'", environment_id);
            return None;
        };

        match resolver.resolve_environment_config(environment_id).await {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("Failed to resolve environment '{}': {}", environment_id, e);
                None
            }
        }
    }

    async fn execute_one(
        &self,
        run_id: &str,
        template: &RequestTemplate,
        resolved: &ResolvedEnvironment,
    ) -> EnvironmentExecution {
        let environment = &resolved.environment;
        let request = template.to_request(environment, &resolved.resolved_headers);
        let result = self.executor.execute(&request).await;

        let executed_at = Utc::now();
        let content = render_artifact(run_id, &environment.name, executed_at, &request, &result);
        let file_name = artifact_file_name(executed_at, &environment.name);

        match write_artifact(&self.comparisons_dir, &file_name, &content).await {
            Ok(path) => EnvironmentExecution {
                environment_id: environment.id.clone(),
                environment_name: environment.name.clone(),
                error: result.error.clone(),
                result,
                artifact: Some(path),
            },
            Err(e) => EnvironmentExecution::failed(
                &environment.id,
                &environment.name,
                format!("Failed to write comparison artifact: {}", e),
            ),
        }
    }
}
