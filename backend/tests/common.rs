// Common test utilities and helpers
use axum::{
  body::{to_bytes, Body},
  http::{header, Method, Request, StatusCode},
  Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use testlab_backend::app::build_router;
use testlab_backend::config::{DatabaseKind, Settings};
use testlab_backend::{AppState, Database};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "bootstrap-pass";
pub const FAILURE_DELAY: Duration = Duration::from_millis(200);

/// Fresh in-memory SQLite database with the schema applied
///
/// Every call gets its own database, so tests never share rows.
pub async fn setup_test_db() -> anyhow::Result<Database> {
  let db = Database::connect(DatabaseKind::Sqlite, "sqlite::memory:").await?;
  db.init_schema().await?;
  Ok(db)
}

/// Settings tuned for tests: cheap bcrypt, short failure delay
pub fn test_settings(dir: &TempDir, with_db: bool) -> Settings {
  Settings {
    data_dir: dir.path().to_path_buf(),
    database_kind: if with_db {
      DatabaseKind::Sqlite
    } else {
      DatabaseKind::None
    },
    database_url: with_db.then(|| "sqlite::memory:".to_string()),
    admin_username: ADMIN_USERNAME.to_string(),
    admin_password: ADMIN_PASSWORD.to_string(),
    login_failure_delay: FAILURE_DELAY,
    bcrypt_cost: 4,
    development: true,
    ..Settings::default()
  }
}

pub struct TestApp {
  pub state: Arc<AppState>,
  pub router: Router,
  // Held so the data directory outlives the app
  pub dir: TempDir,
}

impl TestApp {
  pub async fn spawn(with_db: bool) -> Self {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    Self::with_settings(test_settings(&dir, with_db), dir).await
  }

  pub async fn with_settings(settings: Settings, dir: TempDir) -> Self {
    let state = AppState::initialize(settings)
      .await
      .expect("Failed to initialize app state");
    let router = build_router(state.clone());
    Self { state, router, dir }
  }

  /// Send a request and decode the JSON body (Null when empty)
  pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
    let response = self
      .router
      .clone()
      .oneshot(request)
      .await
      .expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
      .await
      .expect("Failed to read body");
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::String(
        String::from_utf8_lossy(&bytes).to_string(),
      ))
    };
    (status, body)
  }

  pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    self.send(request(Method::GET, uri, token, None)).await
  }

  pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    self.send(request(Method::POST, uri, token, Some(body))).await
  }

  /// Log in and return the session token
  pub async fn login(&self, username: &str, password: &str) -> String {
    let (status, body) = self
      .post(
        "/auth/login",
        None,
        serde_json::json!({ "username": username, "password": password }),
      )
      .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["sessionToken"]
      .as_str()
      .expect("login response should carry a token")
      .to_string()
  }

  pub async fn login_admin(&self) -> String {
    self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
  }
}

pub fn request(
  method: Method,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header("X-Session-Token", token);
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  builder.body(body).expect("Failed to build request")
}

/// Body for a complete first-run setup
pub fn setup_body(username: &str, password: &str) -> Value {
  serde_json::json!({
    "database": { "type": "none" },
    "admin": { "username": username, "password": password, "email": "ops@example.com" },
    "ai": { "claude": { "apiKey": "sk-ant-test-key-1234" } }
  })
}
