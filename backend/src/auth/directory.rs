use axum::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::credentials::{CredentialSource, StoredCredential};
use crate::config::SetupConfig;
use crate::db::Database;

/// User id sessions carry when the admin comes from config or environment
pub const CONFIG_ADMIN_ID: &str = "admin";

/// Looks up admin credentials.
///
/// After setup the `users` table is consulted first (when a SQL backend is
/// configured), then the admin block of `config.json`. Before setup only the
/// bootstrap admin from the environment can log in.
pub struct AdminDirectory {
  config: Arc<RwLock<SetupConfig>>,
  db: Option<Database>,
  bootstrap_username: String,
  bootstrap_hash: String,
}

impl AdminDirectory {
  pub fn new(
    config: Arc<RwLock<SetupConfig>>,
    db: Option<Database>,
    bootstrap_username: impl Into<String>,
    bootstrap_hash: impl Into<String>,
  ) -> Self {
    Self {
      config,
      db,
      bootstrap_username: bootstrap_username.into(),
      bootstrap_hash: bootstrap_hash.into(),
    }
  }
}

#[async_trait]
impl CredentialSource for AdminDirectory {
  async fn find(&self, username: &str) -> anyhow::Result<Option<StoredCredential>> {
    let config = self.config.read().await;

    if !config.is_setup {
      if username == self.bootstrap_username {
        return Ok(Some(StoredCredential {
          user_id: CONFIG_ADMIN_ID.to_string(),
          password_hash: self.bootstrap_hash.clone(),
        }));
      }
      return Ok(None);
    }

    if let Some(db) = &self.db {
      if let Some(user) = db.get_user_by_username(username).await? {
        return Ok(Some(StoredCredential {
          user_id: user.id,
          password_hash: user.password_hash,
        }));
      }
    }

    if config.admin.username == username && !config.admin.password_hash.is_empty() {
      return Ok(Some(StoredCredential {
        user_id: CONFIG_ADMIN_ID.to_string(),
        password_hash: config.admin.password_hash.clone(),
      }));
    }

    Ok(None)
  }
}
