use axum::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::session::{Session, SessionStatus, SessionStore};
use crate::crypto::verify_password;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
  #[error("Username and password are required")]
  MissingCredentials,
  #[error("Invalid credentials")]
  InvalidCredentials,
  #[error("Session expired")]
  SessionExpired,
  #[error("Authentication required")]
  Unauthenticated,
  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}

/// Behaviour applied to every login attempt
#[derive(Debug, Clone, Copy)]
pub struct LoginPolicy {
  /// Fixed pause before a failed attempt is answered. Not exponential and
  /// not tracked per client.
  pub failure_delay: Duration,
}

impl Default for LoginPolicy {
  fn default() -> Self {
    Self {
      failure_delay: Duration::from_secs(1),
    }
  }
}

/// A username's stored hash and the id sessions are issued for
#[derive(Debug, Clone)]
pub struct StoredCredential {
  pub user_id: String,
  pub password_hash: String,
}

#[async_trait]
pub trait CredentialSource: Send + Sync {
  async fn find(&self, username: &str) -> anyhow::Result<Option<StoredCredential>>;
}

pub struct Authenticator {
  policy: LoginPolicy,
  sessions: Arc<dyn SessionStore>,
  credentials: Arc<dyn CredentialSource>,
}

impl Authenticator {
  pub fn new(
    policy: LoginPolicy,
    sessions: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialSource>,
  ) -> Self {
    Self {
      policy,
      sessions,
      credentials,
    }
  }

  /// Verify a username and password and open a session.
  ///
  /// Unknown users and wrong passwords fail the same way, after the policy's
  /// delay. Missing fields fail immediately.
  pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
    if username.trim().is_empty() || password.is_empty() {
      return Err(AuthError::MissingCredentials);
    }

    let verified = match self.credentials.find(username.trim()).await? {
      Some(credential) if verify_password(password, &credential.password_hash) => Some(credential),
      _ => None,
    };

    let Some(credential) = verified else {
      tracing::warn!(username = %username.trim(), "Failed login attempt");
      tokio::time::sleep(self.policy.failure_delay).await;
      return Err(AuthError::InvalidCredentials);
    };

    let session = self.sessions.create(&credential.user_id).await?;
    tracing::info!(user_id = %credential.user_id, "Admin logged in");
    Ok(session)
  }

  /// Resolve a token to its user id
  pub async fn authenticate(&self, token: Option<&str>) -> Result<String, AuthError> {
    let token = token
      .filter(|t| !t.is_empty())
      .ok_or(AuthError::Unauthenticated)?;
    match self.sessions.validate(token).await? {
      SessionStatus::Active { user_id } => Ok(user_id),
      SessionStatus::Expired => Err(AuthError::SessionExpired),
      SessionStatus::Unknown => Err(AuthError::Unauthenticated),
    }
  }

  pub async fn logout(&self, token: &str) -> Result<bool, AuthError> {
    Ok(self.sessions.destroy(token).await?)
  }
}
