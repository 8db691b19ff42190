// Integration tests for analysis history
use crate::common::setup_test_db;

#[tokio::test]
async fn test_history_insert_and_list() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  let entry = db
    .insert_history(Some("admin"), "abc123", "eslint", "eslint", r#"{"score":90}"#)
    .await
    .expect("Failed to insert history");
  assert_eq!(entry.user_id.as_deref(), Some("admin"));

  let rows = db
    .list_history_for_user("admin", 50)
    .await
    .expect("Failed to list history");
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].id, entry.id);
  assert_eq!(rows[0].code_hash, "abc123");
  assert_eq!(rows[0].result, r#"{"score":90}"#);
}

#[tokio::test]
async fn test_history_is_scoped_and_limited() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  for i in 0..5 {
    db.insert_history(Some("admin"), &format!("hash-{}", i), "htmlhint", "htmlhint", "{}")
      .await
      .expect("Failed to insert history");
  }
  db.insert_history(Some("other"), "hash-x", "htmlhint", "htmlhint", "{}")
    .await
    .expect("Failed to insert history");
  db.insert_history(None, "hash-anon", "htmlhint", "htmlhint", "{}")
    .await
    .expect("Failed to insert history");

  let rows = db
    .list_history_for_user("admin", 3)
    .await
    .expect("Failed to list history");
  assert_eq!(rows.len(), 3);
  assert!(rows.iter().all(|r| r.user_id.as_deref() == Some("admin")));
}
