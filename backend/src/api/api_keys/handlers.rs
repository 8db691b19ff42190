use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analyzers::AiService;
use crate::api::common::{bad_request, config_error, internal_error, ApiError, ErrorResponse, SuccessResponse};
use crate::config::store::normalize_service;
use crate::crypto::{is_masked, is_placeholder_key, mask_api_key};
use crate::AppState;

// API Key schemas
#[derive(Serialize, ToSchema)]
pub struct MaskedKeysResponse {
    /// Masked key per normalized service name
    keys: BTreeMap<String, String>,
    configured: usize,
    services: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveApiKeyRequest {
    #[serde(default)]
    service: String,
    #[serde(default)]
    api_key: String,
}

#[utoipa::path(
    get,
    path = "/admin/api-keys",
    tag = "API Keys",
    responses(
        (status = 200, description = "Masked API keys", body = MaskedKeysResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn list_api_keys(State(state): State<Arc<AppState>>) -> Json<MaskedKeysResponse> {
    let keys: BTreeMap<String, String> = state
        .effective_api_keys()
        .await
        .into_iter()
        .map(|(service, key)| (service, mask_api_key(&key)))
        .collect();

    let mut services: Vec<String> = [AiService::Claude, AiService::ChatGpt]
        .iter()
        .map(|s| s.key_name().to_string())
        .collect();
    for service in keys.keys() {
        if !services.contains(service) {
            services.push(service.clone());
        }
    }

    Json(MaskedKeysResponse {
        configured: keys.len(),
        keys,
        services,
    })
}

#[utoipa::path(
    post,
    path = "/admin/api-keys",
    tag = "API Keys",
    request_body = SaveApiKeyRequest,
    responses(
        (status = 200, description = "Key stored", body = SuccessResponse),
        (status = 400, description = "Missing service or placeholder key", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn save_api_key(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveApiKeyRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if body.service.trim().is_empty() {
        return Err(bad_request("Service is required"));
    }
    let api_key = body.api_key.trim();
    if is_placeholder_key(api_key) || is_masked(api_key) {
        return Err(bad_request("A real API key is required"));
    }

    let service = normalize_service(&body.service);
    store_api_key(&state, &service, api_key).await?;
    state.refresh_analyzers().await;

    Ok(Json(SuccessResponse::new(format!(
        "API key for {} saved",
        service
    ))))
}

/// Write a key to the config file and, when configured, the database
pub(crate) async fn store_api_key(
    state: &AppState,
    service: &str,
    api_key: &str,
) -> Result<(), ApiError> {
    let dev = state.settings.development;

    {
        let mut config = state.config.write().await;
        config.ai.set_key(service, api_key);
        if config.is_setup {
            state
                .config_store
                .save(&config)
                .await
                .map_err(|e| config_error(e, dev))?;
        }
    }

    if let Some(db) = &state.db {
        db.upsert_api_key(service, api_key)
            .await
            .map_err(|e| internal_error("Failed to store API key", e, dev))?;
    }

    tracing::info!(service = %service, "API key updated");
    Ok(())
}
