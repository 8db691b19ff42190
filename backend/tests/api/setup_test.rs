// Integration tests for first-run setup
use axum::http::StatusCode;

use crate::common::{setup_body, TestApp, ADMIN_PASSWORD, ADMIN_USERNAME};
use testlab_backend::config::ConfigStore;

#[tokio::test]
async fn test_setup_completes_once() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app.get("/api/setup/status", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isSetup"], false);

  let (status, body) = app
    .post("/api/setup/complete", None, setup_body("owner", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::OK, "setup failed: {}", body);
  assert_eq!(body["success"], true);

  let (_, body) = app.get("/api/setup/status", None).await;
  assert_eq!(body["isSetup"], true);
  assert!(app.dir.path().join(ConfigStore::CONFIG_FILE).exists());
  assert!(app.dir.path().join(ConfigStore::SETUP_MARKER).exists());

  let (status, body) = app
    .post("/api/setup/complete", None, setup_body("intruder", "intruder-pass"))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error_type"], "SETUP_COMPLETE");

  // The first admin is untouched
  app.login("owner", "owner-pass").await;
  let (status, _) = app
    .post(
      "/auth/login",
      None,
      serde_json::json!({ "username": "intruder", "password": "intruder-pass" }),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_setup_validates_admin() {
  let app = TestApp::spawn(false).await;

  let (status, _) = app
    .post("/api/setup/complete", None, setup_body("", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = app
    .post("/api/setup/complete", None, setup_body("owner", "short"))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"]
    .as_str()
    .is_some_and(|e| e.contains("at least 6")));

  let (_, body) = app.get("/api/setup/status", None).await;
  assert_eq!(body["isSetup"], false);
}

#[tokio::test]
async fn test_bootstrap_admin_retired_after_setup() {
  let app = TestApp::spawn(false).await;
  app.login_admin().await;

  let (status, _) = app
    .post("/api/setup/complete", None, setup_body("owner", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = app
    .post(
      "/auth/login",
      None,
      serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_setup_keys_enable_ai_reviewer() {
  let app = TestApp::spawn(false).await;

  let (status, _) = app
    .post("/api/setup/complete", None, setup_body("owner", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = app.get("/status", None).await;
  assert_eq!(body["services"]["claude"], true);
  assert_eq!(body["services"]["chatgpt"], false);
}

#[tokio::test]
async fn test_setup_writes_admin_and_keys_to_database() {
  let app = TestApp::spawn(true).await;

  let (status, _) = app
    .post("/api/setup/complete", None, setup_body("owner", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::OK);

  let db = app.state.db.as_ref().expect("database should be configured");
  let user = db
    .get_user_by_username("owner")
    .await
    .expect("Failed to query user")
    .expect("admin should be stored");
  assert_eq!(user.email.as_deref(), Some("ops@example.com"));
  assert!(user.password_hash.starts_with("$2"));

  let keys = db
    .list_active_api_keys()
    .await
    .expect("Failed to list keys");
  let key = keys
    .iter()
    .find(|k| k.service == "claude")
    .expect("key should be stored");
  assert_eq!(key.api_key, "sk-ant-test-key-1234");

  app.login("owner", "owner-pass").await;
}

#[tokio::test]
async fn test_setup_survives_restart() {
  let app = TestApp::spawn(false).await;
  let (status, _) = app
    .post("/api/setup/complete", None, setup_body("owner", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::OK);

  let dir = app.dir;
  let settings = crate::common::test_settings(&dir, false);
  let restarted = TestApp::with_settings(settings, dir).await;

  let (_, body) = restarted.get("/health", None).await;
  assert_eq!(body["isSetup"], true);
  restarted.login("owner", "owner-pass").await;
}

#[tokio::test]
async fn test_database_connection_check() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app
    .post(
      "/api/setup/test-database",
      None,
      serde_json::json!({ "type": "none" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);

  let (_, body) = app
    .post(
      "/api/setup/test-database",
      None,
      serde_json::json!({ "type": "sqlite", "url": "sqlite::memory:" }),
    )
    .await;
  assert_eq!(body["success"], true);
  assert!(body["latencyMs"].is_u64());

  let (_, body) = app
    .post(
      "/api/setup/test-database",
      None,
      serde_json::json!({ "type": "mysql" }),
    )
    .await;
  assert_eq!(body["success"], false);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_database_check_never_creates_files() {
  let app = TestApp::spawn(false).await;
  let target = app.dir.path().join("elsewhere.db");
  let url = format!("sqlite://{}?mode=rwc", target.display());

  let (status, body) = app
    .post(
      "/api/setup/test-database",
      None,
      serde_json::json!({ "type": "sqlite", "url": url }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], false);
  assert!(!target.exists());
}

#[tokio::test]
async fn test_database_check_closed_after_setup() {
  let app = TestApp::spawn(false).await;
  let (status, _) = app
    .post("/api/setup/complete", None, setup_body("owner", "owner-pass"))
    .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = app
    .post(
      "/api/setup/test-database",
      None,
      serde_json::json!({ "type": "sqlite", "url": "sqlite::memory:" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error_type"], "SETUP_COMPLETE");
}
