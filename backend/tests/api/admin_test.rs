// Integration tests for the admin panel and AI routing endpoints
use axum::http::StatusCode;

use crate::common::TestApp;
use testlab_backend::crypto::MASK_MARKER;

#[tokio::test]
async fn test_saved_keys_are_masked() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, body) = app
    .post(
      "/admin/api-keys",
      Some(&token),
      serde_json::json!({ "service": "anthropic", "apiKey": "sk-ant-abcdef123456" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK, "save failed: {}", body);

  let (status, body) = app.get("/admin/api-keys", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["configured"], 1);
  assert_eq!(body["keys"]["claude"], format!("{}3456", MASK_MARKER));
  assert!(!body.to_string().contains("sk-ant-abcdef"));

  // The same keys are served under the AI routes
  let (_, ai_body) = app.get("/api/ai/keys", Some(&token)).await;
  assert_eq!(ai_body["keys"], body["keys"]);

  let (_, config) = app.get("/admin/config", Some(&token)).await;
  assert_eq!(config["claudeApiKey"], format!("{}3456", MASK_MARKER));
  assert_eq!(config["openaiApiKey"], "");
  let analyzers = config["analyzers"].as_array().expect("analyzers list");
  assert!(analyzers.iter().any(|a| a == "claude"));
}

#[tokio::test]
async fn test_placeholder_and_masked_keys_rejected() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, _) = app
    .post(
      "/admin/api-keys",
      Some(&token),
      serde_json::json!({ "service": "claude", "apiKey": "your-claude-api-key" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = app
    .post(
      "/admin/api-keys",
      Some(&token),
      serde_json::json!({ "service": "claude", "apiKey": format!("{}3456", MASK_MARKER) }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = app
    .post(
      "/admin/api-keys",
      Some(&token),
      serde_json::json!({ "service": "", "apiKey": "sk-real-key-000" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_config_ignores_masked_values() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, _) = app
    .post(
      "/admin/config",
      Some(&token),
      serde_json::json!({ "claudeApiKey": "sk-ant-original-9999", "openaiApiKey": "sk-openai-original-1111" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  // The form echoes the masked claude key and changes only the OpenAI key
  let (status, _) = app
    .post(
      "/admin/config",
      Some(&token),
      serde_json::json!({
        "claudeApiKey": format!("{}9999", MASK_MARKER),
        "openaiApiKey": "sk-openai-rotated-2222"
      }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  let keys = app.state.effective_api_keys().await;
  assert_eq!(keys.get("claude").map(String::as_str), Some("sk-ant-original-9999"));
  assert_eq!(keys.get("chatgpt").map(String::as_str), Some("sk-openai-rotated-2222"));

  let (_, body) = app.post("/admin/test-apis", Some(&token), serde_json::json!({})).await;
  assert_eq!(body["claude"]["success"], true);
  assert_eq!(body["chatgpt"]["success"], true);
}

#[tokio::test]
async fn test_test_apis_reports_missing_keys() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, body) = app.post("/admin/test-apis", Some(&token), serde_json::json!({})).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["claude"]["success"], false);
  assert_eq!(body["claude"]["error"], "Not configured");
}

#[tokio::test]
async fn test_settings_toggle_ai_reviewers() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  app
    .post(
      "/admin/api-keys",
      Some(&token),
      serde_json::json!({ "service": "chatgpt", "apiKey": "sk-openai-abc-7777" }),
    )
    .await;
  let (_, body) = app.get("/status", None).await;
  assert_eq!(body["services"]["chatgpt"], true);

  let (status, _) = app
    .post(
      "/admin/settings",
      Some(&token),
      serde_json::json!({ "enableChatGPT": false, "maxTokens": 1024, "temperature": 0.2 }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = app.get("/status", None).await;
  assert_eq!(body["services"]["chatgpt"], false);

  let (_, config) = app.get("/admin/config", Some(&token)).await;
  assert_eq!(config["enableChatGPT"], false);
  assert_eq!(config["enableClaude"], true);
  assert_eq!(config["maxTokens"], 1024);
}

#[tokio::test]
async fn test_keys_stored_in_database() {
  let app = TestApp::spawn(true).await;
  let token = app.login_admin().await;

  app
    .post(
      "/api/ai/keys",
      Some(&token),
      serde_json::json!({ "service": "openai", "apiKey": "sk-openai-db-4242" }),
    )
    .await;

  let db = app.state.db.as_ref().expect("database should be configured");
  let keys = db
    .list_active_api_keys()
    .await
    .expect("Failed to list keys");
  let key = keys
    .iter()
    .find(|k| k.service == "chatgpt")
    .expect("key should be stored");
  assert_eq!(key.api_key, "sk-openai-db-4242");
}

#[tokio::test]
async fn test_routing_config_round_trip() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, mut view) = app.get("/api/ai/routing-config", Some(&token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["unit_testing"]["model"], "openai");

  view["unit_testing"]["model"] = serde_json::json!("claude");
  view["unit_testing"]["confidence"] = serde_json::json!(60.0);
  let (status, _) = app
    .post("/api/ai/routing-config", Some(&token), view)
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, updated) = app.get("/api/ai/routing-config", Some(&token)).await;
  assert_eq!(updated["unit_testing"]["model"], "claude");
  assert_eq!(updated["unit_testing"]["confidence"], 60.0);
  assert!(app.dir.path().join("routing_config.json").exists());
}

#[tokio::test]
async fn test_routing_category_and_query() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, _) = app
    .post(
      "/api/ai/routing-category",
      Some(&token),
      serde_json::json!({
        "categoryName": "visual_testing",
        "keywords": ["screenshot", "visual diff"],
        "primaryModel": "claude",
        "confidence": 50
      }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = app
    .post(
      "/api/ai/test-routing",
      Some(&token),
      serde_json::json!({ "query": "Compare the screenshot with a visual diff" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["selectedCategory"], "visual_testing");
  assert_eq!(body["selectedModel"], "claude_3");
  assert_eq!(body["confidence"], 1.0);

  let (_, stats) = app.get("/api/ai/routing-stats", Some(&token)).await;
  assert_eq!(stats["totalQueries"], 1);
  assert_eq!(stats["categoryBreakdown"]["visual_testing"], 1);
}

#[tokio::test]
async fn test_routing_input_validation() {
  let app = TestApp::spawn(false).await;
  let token = app.login_admin().await;

  let (status, _) = app
    .post(
      "/api/ai/routing-category",
      Some(&token),
      serde_json::json!({ "categoryName": " ", "keywords": ["x"], "primaryModel": "claude" }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = app
    .post(
      "/api/ai/routing-category",
      Some(&token),
      serde_json::json!({ "categoryName": "x", "keywords": ["x"], "primaryModel": "claude", "confidence": 150 }),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = app
    .post("/api/ai/test-routing", Some(&token), serde_json::json!({ "query": "" }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
