// Integration tests for health and status endpoints
use axum::http::StatusCode;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_reports_setup_state() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app.get("/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["isSetup"], false);
  assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_status_lists_builtin_analyzers() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app.get("/status", None).await;
  assert_eq!(status, StatusCode::OK);

  let analyzers: Vec<&str> = body["analyzers"]
    .as_array()
    .expect("analyzers should be a list")
    .iter()
    .filter_map(|a| a.as_str())
    .collect();
  for name in ["accessibility", "eslint", "htmlhint", "stylelint"] {
    assert!(analyzers.contains(&name), "missing analyzer {}", name);
  }

  // No keys configured, so the AI reviewers are reported but unavailable
  assert_eq!(body["services"]["claude"], false);
  assert_eq!(body["services"]["chatgpt"], false);
  assert_eq!(body["services"]["eslint"], true);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app.get("/api-docs/openapi.json", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["info"]["title"], "TestLab API");
  assert!(body["paths"]["/auth/login"].is_object());
}
