use axum::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::crypto::generate_session_token;
use crate::db::Database;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub token: String,
  pub user_id: String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  fn issue(user_id: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
    Self {
      token: generate_session_token(),
      user_id: user_id.to_string(),
      created_at: now,
      expires_at: now + ttl,
    }
  }

  /// A session is valid strictly before its expiry instant
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
  Active { user_id: String },
  Expired,
  Unknown,
}

/// Storage for login sessions. Handlers only see this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
  async fn create(&self, user_id: &str) -> anyhow::Result<Session>;
  async fn validate(&self, token: &str) -> anyhow::Result<SessionStatus>;
  /// Returns false when the token was not known
  async fn destroy(&self, token: &str) -> anyhow::Result<bool>;
  /// Remove every expired session, returning how many were dropped
  async fn sweep_expired(&self) -> anyhow::Result<u64>;
}

/// In-process session map, used when no SQL backend is configured
pub struct MemorySessionStore {
  ttl: Duration,
  sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      sessions: RwLock::new(HashMap::new()),
    }
  }

  pub async fn create_at(&self, user_id: &str, now: DateTime<Utc>) -> Session {
    let session = Session::issue(user_id, now, self.ttl);
    self
      .sessions
      .write()
      .await
      .insert(session.token.clone(), session.clone());
    session
  }

  pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> SessionStatus {
    let mut sessions = self.sessions.write().await;
    match sessions.get(token) {
      None => SessionStatus::Unknown,
      Some(session) if session.is_expired_at(now) => {
        sessions.remove(token);
        SessionStatus::Expired
      }
      Some(session) => SessionStatus::Active {
        user_id: session.user_id.clone(),
      },
    }
  }

  pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> u64 {
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired_at(now));
    (before - sessions.len()) as u64
  }

  pub async fn len(&self) -> usize {
    self.sessions.read().await.len()
  }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
  async fn create(&self, user_id: &str) -> anyhow::Result<Session> {
    Ok(self.create_at(user_id, Utc::now()).await)
  }

  async fn validate(&self, token: &str) -> anyhow::Result<SessionStatus> {
    Ok(self.validate_at(token, Utc::now()).await)
  }

  async fn destroy(&self, token: &str) -> anyhow::Result<bool> {
    Ok(self.sessions.write().await.remove(token).is_some())
  }

  async fn sweep_expired(&self) -> anyhow::Result<u64> {
    Ok(self.sweep_expired_at(Utc::now()).await)
  }
}

/// Sessions kept in the `sessions` table
pub struct SqlSessionStore {
  db: Database,
  ttl: Duration,
}

impl SqlSessionStore {
  pub fn new(db: Database, ttl: Duration) -> Self {
    Self { db, ttl }
  }

  pub async fn create_at(&self, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<Session> {
    let session = Session::issue(user_id, now, self.ttl);
    self
      .db
      .create_session(
        &Uuid::new_v4().to_string(),
        &session.user_id,
        &session.token,
        session.expires_at.timestamp(),
        session.created_at.timestamp(),
      )
      .await?;
    Ok(session)
  }

  pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> anyhow::Result<SessionStatus> {
    let Some(record) = self.db.get_session_by_token(token).await? else {
      return Ok(SessionStatus::Unknown);
    };

    let expires_at = Utc
      .timestamp_opt(record.expires_at, 0)
      .single()
      .unwrap_or(DateTime::<Utc>::MIN_UTC);
    if expires_at <= now {
      self.db.delete_session_by_token(token).await?;
      return Ok(SessionStatus::Expired);
    }

    Ok(SessionStatus::Active {
      user_id: record.user_id,
    })
  }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
  async fn create(&self, user_id: &str) -> anyhow::Result<Session> {
    self.create_at(user_id, Utc::now()).await
  }

  async fn validate(&self, token: &str) -> anyhow::Result<SessionStatus> {
    self.validate_at(token, Utc::now()).await
  }

  async fn destroy(&self, token: &str) -> anyhow::Result<bool> {
    self.db.delete_session_by_token(token).await
  }

  async fn sweep_expired(&self) -> anyhow::Result<u64> {
    self.db.delete_expired_sessions(Utc::now().timestamp()).await
  }
}

/// Run `sweep_expired` on a fixed interval for the life of the process
pub fn spawn_session_sweeper(
  store: Arc<dyn SessionStore>,
  every: std::time::Duration,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately
    interval.tick().await;

    loop {
      interval.tick().await;
      match store.sweep_expired().await {
        Ok(0) => tracing::debug!("Session sweep found nothing to remove"),
        Ok(removed) => tracing::info!(removed, "Removed expired sessions"),
        Err(e) => tracing::error!("Session sweep failed: {}", e),
      }
    }
  })
}
