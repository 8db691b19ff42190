use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::common::{bad_request, config_error, internal_error, ApiError, ErrorResponse, SuccessResponse};
use crate::config::{
  AdminSection, AiSection, AiSettings, ConfigError, DatabaseKind, DatabaseSection, SetupConfig,
};
use crate::crypto::{hash_password, is_placeholder_key};
use crate::db::Database;
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
  is_setup: bool,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct SetupDatabase {
  #[serde(rename = "type", default)]
  kind: Option<String>,
  #[serde(default)]
  url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetupAdmin {
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
  #[serde(default)]
  email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupServiceKey {
  #[serde(default)]
  api_key: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetupRequest {
  #[serde(default)]
  database: SetupDatabase,
  admin: SetupAdmin,
  /// AI keys by service name (`claude`, `chatgpt`, ...)
  #[serde(default)]
  ai: BTreeMap<String, SetupServiceKey>,
  #[serde(default)]
  settings: Option<AiSettingsInput>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiSettingsInput {
  enable_claude: Option<bool>,
  #[serde(alias = "enableChatGPT")]
  enable_chatgpt: Option<bool>,
  max_tokens: Option<u32>,
  temperature: Option<f32>,
}

impl AiSettingsInput {
  pub(crate) fn apply(&self, settings: &mut AiSettings) {
    if let Some(enable) = self.enable_claude {
      settings.enable_claude = enable;
    }
    if let Some(enable) = self.enable_chatgpt {
      settings.enable_chatgpt = enable;
    }
    settings.max_tokens = self
      .max_tokens
      .filter(|t| *t > 0)
      .unwrap_or(AiSettings::default().max_tokens);
    settings.temperature = self
      .temperature
      .filter(|t| *t > 0.0)
      .unwrap_or(AiSettings::default().temperature);
  }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestDatabaseResponse {
  success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  latency_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

#[utoipa::path(
  get,
  path = "/api/setup/status",
  tag = "Setup",
  responses(
    (status = 200, description = "Whether first-run setup has completed", body = SetupStatusResponse)
  )
)]
pub async fn setup_status(State(state): State<Arc<AppState>>) -> Json<SetupStatusResponse> {
  Json(SetupStatusResponse {
    is_setup: state.config.read().await.is_setup,
  })
}

#[utoipa::path(
  post,
  path = "/api/setup/complete",
  tag = "Setup",
  request_body = SetupRequest,
  responses(
    (status = 200, description = "Setup stored", body = SuccessResponse),
    (status = 400, description = "Invalid input or setup already complete", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  )
)]
pub async fn complete_setup(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SetupRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
  let dev = state.settings.development;

  if state.config.read().await.is_setup {
    return Err(config_error(ConfigError::AlreadyComplete, dev));
  }

  let username = body.admin.username.trim();
  if username.is_empty() {
    return Err(bad_request("Admin username is required"));
  }
  if body.admin.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(bad_request(format!(
      "Admin password must be at least {} characters",
      MIN_PASSWORD_LEN
    )));
  }

  let kind = match body.database.kind.as_deref() {
    Some(kind) => kind
      .parse::<DatabaseKind>()
      .map_err(bad_request)?,
    None => DatabaseKind::None,
  };

  let password_hash = hash_password(&body.admin.password, state.settings.bcrypt_cost)
    .map_err(|e| internal_error("Failed to hash password", e, dev))?;

  let mut ai = AiSection::default();
  for (service, key) in &body.ai {
    if let Some(api_key) = key.api_key.as_deref().filter(|k| !is_placeholder_key(k)) {
      ai.set_key(service, api_key);
    }
  }

  let mut settings = AiSettings::default();
  if let Some(input) = &body.settings {
    input.apply(&mut settings);
  }

  let email = body
    .admin
    .email
    .as_deref()
    .map(str::trim)
    .filter(|e| !e.is_empty())
    .map(str::to_string);

  let config = SetupConfig {
    is_setup: true,
    database: DatabaseSection {
      kind: kind.as_str().to_string(),
      url: body.database.url.clone().filter(|u| !u.trim().is_empty()),
    },
    admin: AdminSection {
      username: username.to_string(),
      password_hash: password_hash.clone(),
      email,
    },
    ai,
    settings,
    setup_completed_at: Some(chrono::Utc::now().to_rfc3339()),
  };

  state
    .config_store
    .complete(&config)
    .await
    .map_err(|e| config_error(e, dev))?;
  *state.config.write().await = config.clone();
  tracing::info!(admin = %username, "First-run setup complete");

  if let Some(db) = &state.db {
    store_setup_in_database(db, &config, &password_hash)
      .await
      .map_err(|e| internal_error("Failed to store setup in database", e, dev))?;
  }

  state.refresh_analyzers().await;

  Ok(Json(SuccessResponse::new("Setup complete")))
}

async fn store_setup_in_database(
  db: &Database,
  config: &SetupConfig,
  password_hash: &str,
) -> anyhow::Result<()> {
  let username = &config.admin.username;
  if db.get_user_by_username(username).await?.is_some() {
    db.update_password_hash(username, password_hash).await?;
  } else {
    db.create_user(
      &Uuid::new_v4().to_string(),
      username,
      password_hash,
      config.admin.email.as_deref(),
      "admin",
    )
    .await?;
  }

  for (service, key) in &config.ai.services {
    if !key.api_key.is_empty() {
      db.upsert_api_key(service, &key.api_key).await?;
    }
  }
  Ok(())
}

#[utoipa::path(
  post,
  path = "/api/setup/test-database",
  tag = "Setup",
  request_body = SetupDatabase,
  responses(
    (status = 200, description = "Connection attempt result", body = TestDatabaseResponse),
    (status = 400, description = "Setup already completed", body = ErrorResponse)
  )
)]
pub async fn test_database(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SetupDatabase>,
) -> Result<Json<TestDatabaseResponse>, ApiError> {
  if state.config.read().await.is_setup {
    return Err(config_error(ConfigError::AlreadyComplete, state.settings.development));
  }

  let failure = |error: String| {
    Ok(Json(TestDatabaseResponse {
      success: false,
      latency_ms: None,
      error: Some(error),
    }))
  };

  let kind = match body.kind.as_deref().unwrap_or("none").parse::<DatabaseKind>() {
    Ok(kind) => kind,
    Err(e) => return failure(e),
  };

  let url = match (kind, body.url.filter(|u| !u.trim().is_empty())) {
    (DatabaseKind::None, _) => {
      return Ok(Json(TestDatabaseResponse {
        success: true,
        latency_ms: None,
        error: None,
      }))
    }
    (DatabaseKind::Sqlite, Some(url)) => read_only_sqlite_url(&url),
    (_, Some(url)) => url,
    (DatabaseKind::Sqlite, None) => format!(
      "sqlite://{}?mode=rwc",
      state.settings.data_dir.join("testlab.db").display()
    ),
    (DatabaseKind::MySql, None) => return failure("Database URL is required".to_string()),
  };

  let result = async {
    let db = Database::connect(kind, &url).await?;
    let latency = db.ping().await;
    db.pool.close().await;
    latency
  }
  .await;

  match result {
    Ok(latency) => Ok(Json(TestDatabaseResponse {
      success: true,
      latency_ms: Some(latency.as_millis() as u64),
      error: None,
    })),
    Err(e) => {
      tracing::warn!(backend = kind.as_str(), "Database connection test failed: {:#}", e);
      failure(format!("{:#}", e))
    }
  }
}

/// Open a caller-supplied SQLite URL without write or create access
fn read_only_sqlite_url(url: &str) -> String {
  let (base, query) = url.split_once('?').unwrap_or((url, ""));
  let path = base.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
  if path == ":memory:" {
    return base.to_string();
  }
  let mut params: Vec<&str> = query
    .split('&')
    .filter(|p| !p.is_empty() && !p.starts_with("mode="))
    .collect();
  params.push("mode=ro");
  format!("{}?{}", base, params.join("&"))
}
