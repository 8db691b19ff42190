// Integration tests for the SQL-backed session store
use chrono::{Duration, Utc};

use crate::common::setup_test_db;
use testlab_backend::auth::{SessionStatus, SessionStore, SqlSessionStore};

#[tokio::test]
async fn test_session_lifecycle() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  let store = SqlSessionStore::new(db.clone(), Duration::hours(24));

  let session = store.create("admin").await.expect("Failed to create session");
  assert_eq!(session.token.len(), 64);
  assert_eq!(session.expires_at - session.created_at, Duration::hours(24));

  let status = store
    .validate(&session.token)
    .await
    .expect("Failed to validate");
  assert_eq!(
    status,
    SessionStatus::Active {
      user_id: "admin".to_string()
    }
  );

  assert!(store.destroy(&session.token).await.expect("Failed to destroy"));
  assert!(!store.destroy(&session.token).await.expect("Failed to destroy"));
  assert_eq!(
    store.validate(&session.token).await.expect("Failed to validate"),
    SessionStatus::Unknown
  );
}

#[tokio::test]
async fn test_expired_session_is_removed_on_validate() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  let store = SqlSessionStore::new(db.clone(), Duration::hours(24));

  let issued = Utc::now() - Duration::hours(25);
  let session = store
    .create_at("admin", issued)
    .await
    .expect("Failed to create session");

  let status = store
    .validate_at(&session.token, Utc::now())
    .await
    .expect("Failed to validate");
  assert_eq!(status, SessionStatus::Expired);

  let row = db
    .get_session_by_token(&session.token)
    .await
    .expect("Failed to query session");
  assert!(row.is_none(), "expired session should be deleted");
}

#[tokio::test]
async fn test_session_boundary_is_exclusive() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  let store = SqlSessionStore::new(db, Duration::hours(24));

  let issued = Utc::now();
  let session = store
    .create_at("admin", issued)
    .await
    .expect("Failed to create session");

  let just_before = session.expires_at - Duration::seconds(1);
  assert!(matches!(
    store
      .validate_at(&session.token, just_before)
      .await
      .expect("Failed to validate"),
    SessionStatus::Active { .. }
  ));

  assert_eq!(
    store
      .validate_at(&session.token, session.expires_at)
      .await
      .expect("Failed to validate"),
    SessionStatus::Expired
  );
}

#[tokio::test]
async fn test_sweep_expired_sessions() {
  let db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  let store = SqlSessionStore::new(db.clone(), Duration::hours(24));

  store
    .create_at("admin", Utc::now() - Duration::hours(48))
    .await
    .expect("Failed to create session");
  let live = store.create("admin").await.expect("Failed to create session");

  let removed = store.sweep_expired().await.expect("Failed to sweep");
  assert_eq!(removed, 1);
  assert!(db
    .get_session_by_token(&live.token)
    .await
    .expect("Failed to query session")
    .is_some());
}
