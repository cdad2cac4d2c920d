//! Notebook sessions: file format, cell dispatch and variable flow.

use super::executor;
use api_notebook::environment::{AuthConfig, Credentials, Environment};
use api_notebook::notebook::{
    convert_text_to_notebook, deserialize, export_to_http_file, serialize, CellKind, CellLanguage,
    CellOutput, NotebookCell, NotebookController, NotebookDocument,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_notebook(base_url: &str) -> NotebookDocument {
    NotebookDocument::new(vec![
        NotebookCell::markup("# Login flow\n\nLogs in, then lists the user's projects."),
        NotebookCell::json(format!(r#"{{"baseUrl": "{}", "user": "jo"}}"#, base_url)),
        NotebookCell::http(
            "POST {{baseUrl}}/login\nContent-Type: application/json\n\n{\"user\": \"{{user}}\"}",
        ),
        NotebookCell::new(CellKind::Code, CellLanguage::from_id("python"), "print('hi')"),
        NotebookCell::http(
            "GET {{baseUrl}}/users/{{lastId}}/projects\nAuthorization: Bearer {{authToken}}\nX-Raw-Token: {{token}}",
        ),
    ])
}

#[tokio::test]
async fn test_run_all_threads_variables_between_cells() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user": "jo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc", "id": 42})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/42/projects"))
        .and(header("Authorization", "Bearer abc"))
        .and(header("X-Raw-Token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "atlas"}])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("login.apinb");
    std::fs::write(&file, serialize(&login_notebook(&server.uri()))).unwrap();

    let document = deserialize(&std::fs::read(&file).unwrap());
    assert_eq!(document.cells.len(), 5);

    let mut controller = NotebookController::new(executor(Vec::new()))
        .with_document(file.display().to_string())
        .with_history_file(dir.path().join("history.jsonl"));
    let executions = controller.execute_all(&document.cells).await;

    let successes: Vec<bool> = executions.iter().map(|e| e.success).collect();
    assert_eq!(successes, vec![true, true, true, false, true]);

    assert_eq!(controller.variables().get("authToken"), Some(&json!("abc")));
    assert_eq!(controller.variables().get("lastId"), Some(&json!(42)));
    assert_eq!(controller.history().len(), 2);

    match &executions[3].outputs[0] {
        CellOutput::Error { message, .. } => assert!(message.contains("python")),
        other => panic!("expected an error output, got {:?}", other),
    }

    let persisted = api_notebook::history::load_history(&dir.path().join("history.jsonl")).unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[1].request.headers["Authorization"], "[REDACTED]");
}

#[tokio::test]
async fn test_failures_do_not_stop_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let cells = vec![
        NotebookCell::json("[1, 2]"),
        NotebookCell::http("INVALID https://example.com"),
        NotebookCell::http(format!("GET {}/missing", server.uri())),
        NotebookCell::http("GET http://127.0.0.1:1/unreachable"),
        NotebookCell::markup("done"),
    ];

    let mut controller = NotebookController::new(executor(Vec::new()));
    let executions = controller.execute_all(&cells).await;

    assert_eq!(executions.len(), 5);
    assert!(!executions[0].success);
    assert!(!executions[1].success);
    assert!(executions[2].success, "an HTTP error status still renders a response");
    assert!(!executions[3].success);
    assert!(executions[4].success);

    match &executions[0].outputs[0] {
        CellOutput::Error { message, .. } => assert!(message.starts_with("Invalid JSON")),
        other => panic!("expected an error output, got {:?}", other),
    }
    match &executions[1].outputs[0] {
        CellOutput::Error { message, .. } => assert!(message.contains("INVALID")),
        other => panic!("expected an error output, got {:?}", other),
    }
}

#[tokio::test]
async fn test_environment_auth_applies_to_cells() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("X-Api-Key", "k-123"))
        .and(header("X-Env", "staging"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "jo"})))
        .expect(1)
        .mount(&server)
        .await;

    let staging = Environment::new("staging", "Staging", server.uri())
        .with_schema("users")
        .with_auth(AuthConfig::api_key("X-Api-Key"))
        .with_header("X-Env", "staging");
    let mut controller = NotebookController::new(executor(vec![(staging, Some(Credentials::api_key("k-123")))]))
        .with_environment("staging", Some("users".to_string()));

    let cell = NotebookCell::http(format!("GET {}/me", server.uri()));
    let execution = controller.execute_cell(0, &cell).await;

    assert!(execution.success);
    let entry = &controller.history()[0];
    assert_eq!(entry.environment_id.as_deref(), Some("staging"));
    assert_eq!(entry.schema_id.as_deref(), Some("users"));
}

#[test]
fn test_import_then_export_plain_text() {
    let text = "## Users\n\nList every user.\n\nGET https://api.example.com/users\nAccept: application/json\n\n###\n\n# @variables\n# {\"page\": 2}\n\n###\n\n# Create one\nPOST https://api.example.com/users\nContent-Type: application/json\n\n{\"name\": \"Jo\"}\n";

    let cells = convert_text_to_notebook(text, CellLanguage::Markdown);
    let languages: Vec<&CellLanguage> = cells.iter().map(|c| &c.language).collect();
    assert_eq!(
        languages,
        vec![
            &CellLanguage::Markdown,
            &CellLanguage::Http,
            &CellLanguage::Json,
            &CellLanguage::Http
        ]
    );
    assert!(cells[3].content.starts_with("# Create one\nPOST"));

    let document = NotebookDocument::new(cells.clone());
    let reloaded = deserialize(&serialize(&document));
    assert_eq!(reloaded.cells, document.cells);

    let exported = export_to_http_file(&reloaded.cells);
    let reimported = convert_text_to_notebook(&exported, CellLanguage::Markdown);
    let contents: Vec<&str> = reimported.iter().map(|c| c.content.as_str()).collect();
    assert!(contents.contains(&"GET https://api.example.com/users\nAccept: application/json"));
    assert!(contents.contains(&"{\"page\": 2}"));
}

#[test]
fn test_corrupt_notebook_keeps_raw_text() {
    let raw = "<!-- cell id=\"a\" kind=\"code\" language=\"http\" -->\nGET https://example.com\n";
    let document = deserialize(raw.as_bytes());

    assert!(document.cells.len() >= 2);
    assert_eq!(document.cells[0].kind, CellKind::Markup);
    assert!(document.cells.iter().any(|c| c.content.contains("GET https://example.com")));
}
