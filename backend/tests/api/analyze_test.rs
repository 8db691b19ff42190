// Integration tests for the analysis endpoint
use axum::extract::ConnectInfo;
use axum::http::{Method, StatusCode};
use std::net::SocketAddr;

use crate::common::{request, test_settings, TestApp};
use testlab_backend::crypto::sha256_hex;

const RISKY_JS: &str = "const input = location.hash;\neval(input);\n";

#[tokio::test]
async fn test_eslint_report() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app
    .post("/analyze/eslint", None, serde_json::json!({ "code": RISKY_JS }))
    .await;
  assert_eq!(status, StatusCode::OK, "analysis failed: {}", body);
  assert_eq!(body["analyzer"], "eslint");

  let issues = body["issues"].as_array().expect("issues should be a list");
  assert!(issues.iter().any(|i| i["rule"] == "no-eval"));
  let score = body["score"].as_u64().expect("score should be numeric");
  assert!(score < 100);
  assert!(body["stats"].is_object());
}

#[tokio::test]
async fn test_analyzer_name_is_case_insensitive() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app
    .post("/analyze/HTMLHint", None, serde_json::json!({ "code": "<p>hello</p>" }))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["analyzer"], "htmlhint");
}

#[tokio::test]
async fn test_unknown_analyzer_lists_available() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app
    .post("/analyze/pylint", None, serde_json::json!({ "code": "x = 1" }))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Analyzer 'pylint' not available");
  let available = body["availableAnalyzers"]
    .as_array()
    .expect("available analyzers should be listed");
  assert!(available.iter().any(|a| a == "stylelint"));
}

#[tokio::test]
async fn test_missing_code_rejected() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app
    .post("/analyze/eslint", None, serde_json::json!({}))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Code is required");

  let (status, _) = app
    .post("/analyze/eslint", None, serde_json::json!({ "code": "   " }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_refuses_after_max() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let mut settings = test_settings(&dir, false);
  settings.rate_limit_max_requests = 2;
  let app = TestApp::with_settings(settings, dir).await;

  for _ in 0..2 {
    let (status, _) = app
      .post("/analyze/eslint", None, serde_json::json!({ "code": "let a = 1;" }))
      .await;
    assert_eq!(status, StatusCode::OK);
  }

  let (status, body) = app
    .post("/analyze/eslint", None, serde_json::json!({ "code": "let a = 1;" }))
    .await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
  assert_eq!(body["error_type"], "RATE_LIMITED");

  // Only analysis is limited
  let (status, _) = app.get("/health", None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_authenticated_analysis_is_recorded() {
  let app = TestApp::spawn(true).await;
  let token = app.login_admin().await;

  let (status, _) = app
    .post(
      "/analyze/eslint",
      Some(&token),
      serde_json::json!({ "code": RISKY_JS, "analysisTypes": ["security"] }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  // Anonymous runs are not recorded
  let (status, _) = app
    .post("/analyze/eslint", None, serde_json::json!({ "code": RISKY_JS }))
    .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = app.get("/admin/history", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  let history = body["history"].as_array().expect("history should be a list");
  assert_eq!(history.len(), 1);
  assert_eq!(history[0]["analyzer"], "eslint");
  assert_eq!(history[0]["codeHash"], sha256_hex(RISKY_JS));
  assert_eq!(history[0]["analysisTypes"], serde_json::json!(["security"]));
  assert_eq!(history[0]["result"]["analyzer"], "eslint");
}

#[tokio::test]
async fn test_history_empty_without_database() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  app
    .post("/analyze/eslint", Some(&token), serde_json::json!({ "code": RISKY_JS }))
    .await;

  let (status, body) = app.get("/admin/history", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["history"], serde_json::json!([]));
}

#[tokio::test]
async fn test_rotating_forwarded_header_does_not_evade_limit() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let mut settings = test_settings(&dir, false);
  settings.rate_limit_max_requests = 2;
  let app = TestApp::with_settings(settings, dir).await;
  let peer: SocketAddr = "198.51.100.1:40000".parse().expect("valid addr");

  let mut statuses = Vec::new();
  for i in 0..10 {
    let mut req = request(
      Method::POST,
      "/analyze/eslint",
      None,
      Some(serde_json::json!({ "code": "let a = 1;" })),
    );
    req
      .headers_mut()
      .insert("x-forwarded-for", format!("10.9.9.{}", i).parse().expect("valid header"));
    req.extensions_mut().insert(ConnectInfo(peer));
    statuses.push(app.send(req).await.0);
  }

  assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
  assert!(statuses[2..]
    .iter()
    .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
  assert_eq!(app.state.rate_limiter.tracked_clients(), 1);
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_last_hop() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let mut settings = test_settings(&dir, false);
  settings.rate_limit_max_requests = 1;
  settings.trust_proxy = true;
  let app = TestApp::with_settings(settings, dir).await;
  let proxy: SocketAddr = "10.0.0.2:40000".parse().expect("valid addr");

  let send = |forwarded: &'static str| {
    let mut req = request(
      Method::POST,
      "/analyze/eslint",
      None,
      Some(serde_json::json!({ "code": "let a = 1;" })),
    );
    req
      .headers_mut()
      .insert("x-forwarded-for", forwarded.parse().expect("valid header"));
    req.extensions_mut().insert(ConnectInfo(proxy));
    req
  };

  assert_eq!(app.send(send("1.1.1.1, 203.0.113.7")).await.0, StatusCode::OK);
  // A spoofed first entry does not change the proxy-appended hop
  assert_eq!(
    app.send(send("2.2.2.2, 203.0.113.7")).await.0,
    StatusCode::TOO_MANY_REQUESTS
  );
  assert_eq!(app.send(send("203.0.113.8")).await.0, StatusCode::OK);
}
