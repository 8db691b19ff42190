// Integration tests for users database operations
use crate::common::setup_test_db;
use uuid::Uuid;

#[tokio::test]
async fn test_user_creation() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  let user_id = Uuid::new_v4().to_string();
  let user = db
    .create_user(&user_id, "alice", "hashed", Some("alice@example.com"), "admin")
    .await
    .expect("Failed to create user");

  assert_eq!(user.id, user_id);
  assert_eq!(user.username, "alice");
  assert_eq!(user.email.as_deref(), Some("alice@example.com"));
  assert_eq!(user.role, "admin");
}

#[tokio::test]
async fn test_user_retrieval() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  let user_id = Uuid::new_v4().to_string();
  db.create_user(&user_id, "bob", "hashed", None, "admin")
    .await
    .expect("Failed to create user");

  let by_name = db
    .get_user_by_username("bob")
    .await
    .expect("Failed to query user")
    .expect("User should exist");
  assert_eq!(by_name.id, user_id);
  assert_eq!(by_name.password_hash, "hashed");
  assert!(by_name.email.is_none());

  let by_id = db
    .get_user_by_id(&user_id)
    .await
    .expect("Failed to query user")
    .expect("User should exist");
  assert_eq!(by_id.username, "bob");

  let missing = db
    .get_user_by_username("nobody")
    .await
    .expect("Failed to query user");
  assert!(missing.is_none());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  db.create_user(&Uuid::new_v4().to_string(), "carol", "h1", None, "admin")
    .await
    .expect("Failed to create user");

  let duplicate = db
    .create_user(&Uuid::new_v4().to_string(), "carol", "h2", None, "admin")
    .await;
  assert!(duplicate.is_err(), "usernames must be unique");
  assert_eq!(db.count_users().await.expect("Failed to count"), 1);
}

#[tokio::test]
async fn test_update_password_hash() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");

  db.create_user(&Uuid::new_v4().to_string(), "dave", "old", None, "admin")
    .await
    .expect("Failed to create user");

  assert!(db
    .update_password_hash("dave", "new")
    .await
    .expect("Failed to update"));
  assert!(!db
    .update_password_hash("erin", "new")
    .await
    .expect("Failed to update"));

  let user = db
    .get_user_by_username("dave")
    .await
    .expect("Failed to query user")
    .expect("User should exist");
  assert_eq!(user.password_hash, "new");
}
