use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::common::{bad_request, internal_error, ApiError, ErrorResponse, SuccessResponse};
use crate::routing::{CategoryView, LlmType, RoutingStats};
use crate::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCategoryRequest {
  #[serde(default)]
  category_name: String,
  #[serde(default)]
  keywords: Vec<String>,
  /// `openai` or `claude`
  #[serde(default)]
  primary_model: String,
  /// Minimum confidence as a percentage
  #[serde(default = "default_confidence")]
  confidence: f64,
}

fn default_confidence() -> f64 {
  70.0
}

#[derive(Deserialize, ToSchema)]
pub struct TestRoutingRequest {
  #[serde(default)]
  query: String,
  #[serde(default)]
  context: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestRoutingResponse {
  query: String,
  selected_category: String,
  selected_model: LlmType,
  confidence: f64,
  matched_keywords: Vec<String>,
}

#[utoipa::path(
  get,
  path = "/api/ai/routing-config",
  tag = "AI Routing",
  responses(
    (status = 200, description = "Routing categories as the admin panel edits them", body = BTreeMap<String, CategoryView>),
    (status = 401, description = "Not authenticated", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn get_routing_config(
  State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, CategoryView>> {
  Json(state.routing.frontend_view().await)
}

#[utoipa::path(
  post,
  path = "/api/ai/routing-config",
  tag = "AI Routing",
  request_body = BTreeMap<String, CategoryView>,
  responses(
    (status = 200, description = "Existing categories updated", body = SuccessResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn update_routing_config(
  State(state): State<Arc<AppState>>,
  Json(body): Json<BTreeMap<String, CategoryView>>,
) -> Result<Json<SuccessResponse>, ApiError> {
  let updated = state
    .routing
    .apply_view(&body)
    .await
    .map_err(|e| internal_error("Failed to update configuration", e, state.settings.development))?;

  tracing::info!(updated, "Routing configuration updated");
  Ok(Json(SuccessResponse::new("Configuration updated successfully")))
}

#[utoipa::path(
  get,
  path = "/api/ai/routing-stats",
  tag = "AI Routing",
  responses(
    (status = 200, description = "Routing decisions since process start", body = RoutingStats),
    (status = 401, description = "Not authenticated", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn get_routing_stats(State(state): State<Arc<AppState>>) -> Json<RoutingStats> {
  Json(state.routing.stats())
}

#[utoipa::path(
  post,
  path = "/api/ai/routing-category",
  tag = "AI Routing",
  request_body = AddCategoryRequest,
  responses(
    (status = 200, description = "Category added", body = SuccessResponse),
    (status = 400, description = "Invalid category", body = ErrorResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn add_routing_category(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AddCategoryRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
  let name = body.category_name.trim();
  if name.is_empty() {
    return Err(bad_request("Category name is required"));
  }
  if !(0.0..=100.0).contains(&body.confidence) {
    return Err(bad_request("Confidence must be between 0 and 100"));
  }

  let keywords: Vec<String> = body
    .keywords
    .iter()
    .map(|k| k.trim().to_string())
    .filter(|k| !k.is_empty())
    .collect();

  state
    .routing
    .add_category(name, keywords, &body.primary_model, body.confidence)
    .await
    .map_err(|e| internal_error("Failed to add category", e, state.settings.development))?;

  tracing::info!(category = %name, "Routing category added");
  Ok(Json(SuccessResponse::new("Category added successfully")))
}

#[utoipa::path(
  post,
  path = "/api/ai/test-routing",
  tag = "AI Routing",
  request_body = TestRoutingRequest,
  responses(
    (status = 200, description = "Routing decision for the query", body = TestRoutingResponse),
    (status = 400, description = "Empty query", body = ErrorResponse),
    (status = 401, description = "Not authenticated", body = ErrorResponse)
  ),
  security(("session_token" = []), ("cookie_auth" = []))
)]
pub async fn test_routing(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TestRoutingRequest>,
) -> Result<Json<TestRoutingResponse>, ApiError> {
  if body.query.trim().is_empty() {
    return Err(bad_request("Query is required"));
  }

  let decision = state
    .routing
    .test_route(&body.query, body.context.as_deref())
    .await;

  Ok(Json(TestRoutingResponse {
    query: body.query,
    selected_category: decision.category,
    selected_model: decision.model,
    confidence: decision.confidence,
    matched_keywords: decision.matched_keywords,
  }))
}
