// Integration tests for login, logout and session checks
use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use std::time::Instant;

use crate::common::{request, TestApp, ADMIN_PASSWORD, ADMIN_USERNAME, FAILURE_DELAY};

#[tokio::test]
async fn test_login_issues_session_and_cookie() {
  let app = TestApp::spawn(false).await;

  let response = {
    use tower::ServiceExt;
    app
      .router
      .clone()
      .oneshot(request(
        Method::POST,
        "/auth/login",
        None,
        Some(serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD })),
      ))
      .await
      .expect("Failed to send request")
  };
  assert_eq!(response.status(), StatusCode::OK);

  let cookie = response
    .headers()
    .get(header::SET_COOKIE)
    .and_then(|v| v.to_str().ok())
    .expect("login should set a cookie")
    .to_string();
  assert!(cookie.starts_with("sessionToken="));
  assert!(cookie.contains("HttpOnly"));
  assert!(cookie.contains("SameSite=Strict"));
  assert!(cookie.contains("Max-Age=86400"));
}

#[tokio::test]
async fn test_login_response_body() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app
    .post(
      "/auth/login",
      None,
      serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["message"], "Login successful");
  assert_eq!(
    body["sessionToken"].as_str().map(str::len),
    Some(64),
    "token should be 32 random bytes in hex"
  );
  assert!(body["expiresAt"].is_string());
}

#[tokio::test]
async fn test_missing_credentials_rejected_immediately() {
  let app = TestApp::spawn(false).await;

  let started = Instant::now();
  let (status, body) = app
    .post("/auth/login", None, serde_json::json!({ "username": ADMIN_USERNAME }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error_type"], "BAD_REQUEST");
  assert!(started.elapsed() < FAILURE_DELAY);
}

#[tokio::test]
async fn test_wrong_password_is_delayed() {
  let app = TestApp::spawn(false).await;

  let started = Instant::now();
  let (status, body) = app
    .post(
      "/auth/login",
      None,
      serde_json::json!({ "username": ADMIN_USERNAME, "password": "wrong-password" }),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "Invalid credentials");
  assert!(
    started.elapsed() >= FAILURE_DELAY,
    "failed login returned after {:?}",
    started.elapsed()
  );
}

#[tokio::test]
async fn test_unknown_user_is_delayed() {
  let app = TestApp::spawn(false).await;

  let started = Instant::now();
  let (status, _) = app
    .post(
      "/auth/login",
      None,
      serde_json::json!({ "username": "mallory", "password": ADMIN_PASSWORD }),
    )
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(started.elapsed() >= FAILURE_DELAY);
}

#[tokio::test]
async fn test_check_with_header_and_cookie() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, body) = app.get("/auth/check", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["authenticated"], true);
  assert_eq!(body["userId"], "admin");

  let via_cookie = Request::builder()
    .method(Method::GET)
    .uri("/auth/check")
    .header(header::COOKIE, format!("sessionToken={}", token))
    .body(Body::empty())
    .expect("Failed to build request");
  let (status, body) = app.send(via_cookie).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["authenticated"], true);

  let via_bearer = Request::builder()
    .method(Method::GET)
    .uri("/auth/check")
    .header(header::AUTHORIZATION, format!("Bearer {}", token))
    .body(Body::empty())
    .expect("Failed to build request");
  let (_, body) = app.send(via_bearer).await;
  assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn test_check_without_session() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app.get("/auth/check", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["authenticated"], false);
  assert!(body.get("userId").is_none());

  let (_, body) = app.get("/auth/check", Some("not-a-real-token")).await;
  assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, body) = app
    .post("/auth/logout", Some(&token), serde_json::json!({}))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Logged out successfully");

  let (status, _) = app.get("/admin/config", Some(&token)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
  let app = TestApp::spawn(false).await;

  let (status, body) = app.post("/auth/logout", None, serde_json::json!({})).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_admin_routes_require_session() {
  let app = TestApp::spawn(false).await;

  for uri in [
    "/admin/config",
    "/admin/history",
    "/admin/api-keys",
    "/api/ai/keys",
    "/api/ai/routing-config",
    "/api/ai/routing-stats",
  ] {
    let (status, body) = app.get(uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{} should be protected", uri);
    assert_eq!(body["error_type"], "UNAUTHORIZED");
  }
}

#[tokio::test]
async fn test_sessions_persist_in_sql_store() {
  let app = TestApp::spawn(true).await;
  let token = app.login_admin().await;

  let db = app.state.db.as_ref().expect("database should be configured");
  let row = db
    .get_session_by_token(&token)
    .await
    .expect("Failed to query session")
    .expect("session should be stored");
  assert_eq!(row.user_id, "admin");
  assert_eq!(row.expires_at - row.created_at, 24 * 60 * 60);
}
