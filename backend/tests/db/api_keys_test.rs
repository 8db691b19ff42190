// Integration tests for API key storage
use crate::common::setup_test_db;

#[tokio::test]
async fn test_upsert_replaces_active_key() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  db.upsert_api_key("claude", "sk-ant-first")
    .await
    .expect("Failed to store key");
  let second = db
    .upsert_api_key("claude", "sk-ant-second")
    .await
    .expect("Failed to store key");
  assert!(second.active());

  let all_active = db
    .list_active_api_keys()
    .await
    .expect("Failed to list keys");
  assert_eq!(all_active.len(), 1);
  assert_eq!(all_active[0].api_key, "sk-ant-second");
}

#[tokio::test]
async fn test_keys_are_per_service() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  db.upsert_api_key("claude", "sk-ant-1")
    .await
    .expect("Failed to store key");
  db.upsert_api_key("chatgpt", "sk-openai-1")
    .await
    .expect("Failed to store key");

  let mut services: Vec<String> = db
    .list_active_api_keys()
    .await
    .expect("Failed to list keys")
    .into_iter()
    .map(|k| k.service)
    .collect();
  services.sort();
  assert_eq!(services, vec!["chatgpt", "claude"]);
}

