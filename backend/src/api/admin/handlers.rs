use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analyzers::AiService;
use crate::api::api_keys::store_api_key;
use crate::api::auth::AdminUser;
use crate::api::common::{config_error, internal_error, ApiError, ErrorResponse, SuccessResponse};
use crate::api::setup::AiSettingsInput;
use crate::crypto::{is_masked, is_placeholder_key, mask_api_key};
use crate::db::AnalysisHistory;
use crate::AppState;

const HISTORY_LIMIT: i64 = 50;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfigResponse {
  claude_api_key: String,
  openai_api_key: String,
  enable_claude: bool,
  #[serde(rename = "enableChatGPT")]
  enable_chatgpt: bool,
  max_tokens: u32,
  temperature: f32,
  database_type: String,
  analyzers: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigRequest {
  #[serde(default)]
  claude_api_key: Option<String>,
  #[serde(default)]
  openai_api_key: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ServiceCheck {
  success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
  history: Vec<HistoryEntry>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  id: String,
  code_hash: String,
  analysis_types: Vec<String>,
  analyzer: String,
  #[schema(value_type = Object)]
  result: serde_json::Value,
  created_at: i64,
}

impl From<AnalysisHistory> for HistoryEntry {
  fn from(row: AnalysisHistory) -> Self {
    Self {
      analysis_types: row
        .analysis_type
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect(),
      result: serde_json::from_str(&row.result).unwrap_or(serde_json::Value::String(row.result)),
      id: row.id,
      code_hash: row.code_hash,
      analyzer: row.analyzer,
      created_at: row.created_at,
    }
  }
}

#[utoipa::path(
  get,
  path = "/admin/config",
  tag = "Admin",
  responses(
    (status = 200, description = "Masked keys and AI settings", body = AdminConfigResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<AdminConfigResponse> {
  let keys = state.effective_api_keys().await;
  let masked = |service: AiService| {
    keys
      .get(service.key_name())
      .map(|k| mask_api_key(k))
      .unwrap_or_default()
  };

  let config = state.config.read().await;
  let analyzers = state.analyzers.read().await.names();

  Json(AdminConfigResponse {
    claude_api_key: masked(AiService::Claude),
    openai_api_key: masked(AiService::ChatGpt),
    enable_claude: config.settings.enable_claude,
    enable_chatgpt: config.settings.enable_chatgpt,
    max_tokens: config.settings.max_tokens,
    temperature: config.settings.temperature,
    database_type: state
      .db
      .as_ref()
      .map(|db| db.kind.as_str())
      .unwrap_or("none")
      .to_string(),
    analyzers,
  })
}

#[utoipa::path(
  post,
  path = "/admin/config",
  tag = "Admin",
  request_body = UpdateConfigRequest,
  responses(
    (status = 200, description = "Keys updated; masked values are ignored", body = SuccessResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn update_config(
  State(state): State<Arc<AppState>>,
  Json(body): Json<UpdateConfigRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
  let submitted = [
    (AiService::Claude, body.claude_api_key),
    (AiService::ChatGpt, body.openai_api_key),
  ];

  let mut changed = 0;
  for (service, key) in submitted {
    // Masked or template values are the form echoing back what it was given
    let Some(key) = key
      .as_deref()
      .map(str::trim)
      .filter(|k| !is_placeholder_key(k) && !is_masked(k))
    else {
      continue;
    };
    store_api_key(&state, service.key_name(), key).await?;
    changed += 1;
  }

  if changed > 0 {
    state.refresh_analyzers().await;
  }
  Ok(Json(SuccessResponse::new("Configuration updated")))
}

#[utoipa::path(
  post,
  path = "/admin/settings",
  tag = "Admin",
  request_body = AiSettingsInput,
  responses(
    (status = 200, description = "Settings updated", body = SuccessResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn update_settings(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AiSettingsInput>,
) -> Result<Json<SuccessResponse>, ApiError> {
  {
    let mut config = state.config.write().await;
    body.apply(&mut config.settings);
    if config.is_setup {
      state
        .config_store
        .save(&config)
        .await
        .map_err(|e| config_error(e, state.settings.development))?;
    }
    tracing::info!(settings = ?config.settings, "AI settings updated");
  }

  state.refresh_analyzers().await;
  Ok(Json(SuccessResponse::new("Settings updated")))
}

#[utoipa::path(
  post,
  path = "/admin/test-apis",
  tag = "Admin",
  responses(
    (status = 200, description = "Configured check per AI service", body = BTreeMap<String, ServiceCheck>),
    (status = 401, description = "Not authenticated", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn test_apis(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, ServiceCheck>> {
  let keys = state.effective_api_keys().await;

  let results = [AiService::Claude, AiService::ChatGpt]
    .into_iter()
    .map(|service| {
      let check = if keys.contains_key(service.key_name()) {
        ServiceCheck {
          success: true,
          error: None,
        }
      } else {
        ServiceCheck {
          success: false,
          error: Some("Not configured".to_string()),
        }
      };
      (service.key_name().to_string(), check)
    })
    .collect();

  Json(results)
}

#[utoipa::path(
  get,
  path = "/admin/history",
  tag = "Admin",
  responses(
    (status = 200, description = "Most recent analyses by the caller", body = HistoryResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn get_history(
  State(state): State<Arc<AppState>>,
  Extension(user): Extension<AdminUser>,
) -> Result<Json<HistoryResponse>, ApiError> {
  let Some(db) = &state.db else {
    return Ok(Json(HistoryResponse { history: Vec::new() }));
  };

  let rows = db
    .list_history_for_user(&user.user_id, HISTORY_LIMIT)
    .await
    .map_err(|e| internal_error("Failed to fetch history", e, state.settings.development))?;

  Ok(Json(HistoryResponse {
    history: rows.into_iter().map(HistoryEntry::from).collect(),
  }))
}
