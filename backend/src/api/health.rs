use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
    is_setup: bool,
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// Availability per analyzer, including the AI reviewers
    services: BTreeMap<String, bool>,
    analyzers: Vec<String>,
    timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let is_setup = state.config.read().await.is_setup;
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        is_setup,
    })
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "Health",
    responses(
        (status = 200, description = "Available analyzers", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let analyzers = state.analyzers.read().await.names();

    let mut services: BTreeMap<String, bool> = ["claude", "chatgpt"]
        .into_iter()
        .map(|name| (name.to_string(), false))
        .collect();
    for name in &analyzers {
        services.insert(name.clone(), true);
    }

    Json(StatusResponse {
        services,
        analyzers,
        timestamp: Utc::now(),
    })
}
