//! Shared helpers for integration tests.

pub mod group_execution_test;
pub mod notebook_session_test;
pub mod secret_masking_test;

use api_notebook::environment::{Credentials, Environment, FileResolver};
use api_notebook::executor::{ExecutionConfig, RequestExecutor};
use api_notebook::secrets::SecretStore;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Executor over the reqwest transport with a short timeout and no default
/// headers.
pub fn executor(environments: Vec<(Environment, Option<Credentials>)>) -> Arc<RequestExecutor> {
    init_test_env();
    let executor = RequestExecutor::with_reqwest(ExecutionConfig::new(5000), SecretStore::new(4))
        .expect("Failed to build reqwest transport")
        .with_resolver(Arc::new(FileResolver::from_environments(environments)));
    Arc::new(executor)
}
