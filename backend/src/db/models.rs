use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
  pub id: String,
  pub username: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub email: Option<String>,
  pub role: String,
  pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
  pub id: String,
  pub user_id: String,
  pub token: String,
  pub expires_at: i64,
  pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKey {
  pub id: String,
  pub service: String,
  #[serde(skip_serializing)]
  pub api_key: String,
  pub is_active: i64,
  pub created_at: i64,
}

impl ApiKey {
  pub fn active(&self) -> bool {
    self.is_active != 0
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHistory {
  pub id: String,
  pub user_id: Option<String>,
  pub code_hash: String,
  pub analysis_type: String,
  pub analyzer: String,
  pub result: String,
  pub created_at: i64,
}
