//! Replaying a captured request across environments.

use super::executor;
use api_notebook::environment::{AuthConfig, AuthKind, Credentials, Environment};
use api_notebook::group::{GroupExecutor, GroupStatus, RequestTemplate};
use api_notebook::notebook::{NotebookCell, NotebookController};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn orders_server(total: u64, token: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/orders"))
        .and(query_param("status", "open"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": total})))
        .mount(&server)
        .await;
    server
}

fn environment(id: &str, name: &str, base_url: String) -> Environment {
    Environment::new(id, name, base_url)
        .with_schema("orders")
        .with_auth(AuthConfig::new(AuthKind::Bearer))
}

#[tokio::test]
async fn test_history_entry_replayed_across_environments() {
    let staging = orders_server(3, "staging-token").await;
    let production = orders_server(1200, "prod-token").await;

    let environments = vec![
        (
            environment("staging", "Staging", staging.uri()),
            Some(Credentials::api_key("staging-token")),
        ),
        (
            environment("prod", "Production EU", format!("{}/", production.uri())),
            Some(Credentials::api_key("prod-token")),
        ),
        (
            environment("offline", "Offline", "http://127.0.0.1:1".to_string()),
            Some(Credentials::api_key("offline-token")),
        ),
    ];
    let executor = executor(environments);

    // Capture the request by running it once in staging.
    let mut controller = NotebookController::new(executor.clone())
        .with_document("file:///work/orders.apinb")
        .with_environment("staging", Some("orders".to_string()));
    let cell = NotebookCell::http(format!("GET {}/v2/orders?status=open\nAccept: application/json", staging.uri()));
    assert!(controller.execute_cell(0, &cell).await.success);

    let entry = controller.history()[0].sanitized();
    let template = RequestTemplate::from_history_entry(&entry);
    assert_eq!(template.path, "/v2/orders?status=open");
    assert_eq!(template.schema_id.as_deref(), Some("orders"));
    assert!(template.headers.keys().all(|name| !name.eq_ignore_ascii_case("authorization")));

    let workspace = TempDir::new().unwrap();
    let group = GroupExecutor::new(executor, workspace.path());
    let targets: Vec<String> = ["staging", "prod", "offline"].iter().map(|s| s.to_string()).collect();

    let mut progress = Vec::new();
    let mut on_progress = |current: usize, total: usize, name: &str| progress.push((current, total, name.to_string()));
    let result = group
        .execute_across_environments(&template, &targets, Some(&mut on_progress))
        .await;

    assert_eq!(result.status, GroupStatus::Partial);
    assert_eq!(result.summary.total_environments, 3);
    assert_eq!(result.summary.successful_executions, 2);
    assert_eq!(result.summary.failed_executions, 1);
    assert_eq!(result.results.len(), 3);
    assert_eq!(progress.len(), 3);
    assert_eq!(progress[1], (2, 3, "Production EU".to_string()));

    assert_eq!(result.results[0].result.json_body(), Some(&json!({"total": 3})));
    assert_eq!(result.results[1].result.json_body(), Some(&json!({"total": 1200})));
    let offline = &result.results[2];
    assert_eq!(offline.result.status, 0);
    assert!(offline.error.is_some());

    let comparisons = workspace.path().join("api-comparisons");
    let mut files: Vec<String> = std::fs::read_dir(&comparisons)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files.len(), 3);
    assert!(files.iter().any(|f| f.ends_with("_production-eu.md")));

    let prod_artifact = std::fs::read_to_string(result.results[1].artifact.as_ref().unwrap()).unwrap();
    assert!(prod_artifact.contains(&result.id));
    assert!(prod_artifact.contains("```http\nGET "));
    assert!(prod_artifact.contains("/v2/orders?status=open"));
    assert!(prod_artifact.contains("\"total\": 1200"));
    assert!(!prod_artifact.contains("prod-token"));

    let serialized = serde_json::to_value(&result).unwrap();
    assert_eq!(serialized["status"], "partial");
    assert_eq!(serialized["summary"]["failedExecutions"], 1);
}
