//! Request documents never carry real credentials.

use super::executor;
use api_notebook::endpoint::Endpoint;
use api_notebook::environment::{AuthConfig, AuthKind, Credentials, Environment};
use api_notebook::executor::encode_basic;
use api_notebook::models::HttpMethod;
use api_notebook::runner::HttpRunner;
use api_notebook::secrets::{SecretStore, Visibility, MASKED_ANNOTATION};
use api_notebook::variables::VariableContext;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URI: &str = "file:///work/requests/get-account.http";

#[tokio::test]
async fn test_masked_document_round_trip() {
    let server = MockServer::start().await;
    let token = "ghp_4f9c2b7e1d0a8c6b5e3f";
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "jo"})))
        .expect(2)
        .mount(&server)
        .await;

    let environment = Environment::new("prod", "Production", server.uri()).with_auth(AuthConfig::new(AuthKind::Bearer));
    let runner = HttpRunner::new(executor(vec![(environment, Some(Credentials::api_key(token)))]));
    let endpoint = Endpoint::new(HttpMethod::GET, "/account").with_summary("Current account");

    let document = runner.create_request_document(&endpoint, "prod", URI).await.unwrap();
    assert!(!document.text.contains(token));
    assert!(document.text.contains(MASKED_ANNOTATION));
    assert_eq!(SecretStore::visibility(&document.text), Some(Visibility::Masked));

    // Saving writes the masked form only.
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("get-account.http");
    std::fs::write(&file, runner.persistable_text(URI, &document.text)).unwrap();

    let (revealed, _) = runner.toggle_visibility(URI, &document.text).unwrap();
    assert!(revealed.contains(token));
    std::fs::write(&file, runner.persistable_text(URI, &revealed)).unwrap();
    assert!(!std::fs::read_to_string(&file).unwrap().contains(token));

    let variables = VariableContext::new();
    let masked = runner.execute_document(URI, &document.text, &variables).await.unwrap();
    let shown = runner.execute_document(URI, &revealed, &variables).await.unwrap();
    assert!(masked.success);
    assert!(shown.success);

    let (masked_again, visibility) = runner.toggle_visibility(URI, &revealed).unwrap();
    assert_eq!(visibility, Visibility::Masked);
    assert_eq!(masked_again, document.text);
}

#[tokio::test]
async fn test_basic_credentials_are_masked() {
    let server = MockServer::start().await;
    let encoded = encode_basic("svc-reporting", "correct horse battery");
    Mock::given(method("GET"))
        .and(path("/reports"))
        .and(header("Authorization", format!("Basic {}", encoded).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let environment = Environment::new("ops", "Ops", server.uri()).with_auth(AuthConfig::new(AuthKind::Basic));
    let runner = HttpRunner::new(executor(vec![(
        environment,
        Some(Credentials::basic("svc-reporting", "correct horse battery")),
    )]));
    let endpoint = Endpoint::new(HttpMethod::GET, "/reports");

    let document = runner.create_request_document(&endpoint, "ops", URI).await.unwrap();
    assert!(!document.text.contains(&encoded));
    assert!(!document.text.contains("correct horse battery"));

    let result = runner
        .execute_document(URI, &document.text, &VariableContext::new())
        .await
        .unwrap();
    assert!(result.success);

    assert!(runner.close_document(URI));
    assert!(runner.toggle_visibility(URI, &document.text).is_err());
}

#[tokio::test]
async fn test_document_without_credentials_has_no_secret_lines() {
    let server = MockServer::start().await;
    let environment = Environment::new("local", "Local", server.uri()).with_auth(AuthConfig::new(AuthKind::Bearer));
    let runner = HttpRunner::new(executor(vec![(environment, None)]));

    let document = runner
        .create_request_document(&Endpoint::new(HttpMethod::GET, "/health"), "local", URI)
        .await
        .unwrap();

    assert_eq!(SecretStore::visibility(&document.text), None);
    assert!(!document.text.contains("Authorization"));
}
