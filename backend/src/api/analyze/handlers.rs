use axum::{
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analyzers::{AnalysisReport, AnalyzeOptions};
use crate::api::auth::helpers::current_user;
use crate::api::common::{bad_request, internal_error, ErrorResponse};
use crate::crypto::sha256_hex;
use crate::AppState;

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
  #[serde(default)]
  code: Option<String>,
  #[serde(flatten)]
  options: AnalyzeOptions,
}

#[derive(Serialize, ToSchema)]
pub struct UnknownAnalyzerResponse {
  error: String,
  error_type: String,
  #[serde(rename = "availableAnalyzers")]
  available_analyzers: Vec<String>,
}

#[utoipa::path(
  post,
  path = "/analyze/{analyzer}",
  tag = "Analysis",
  request_body = AnalyzeRequest,
  params(
    ("analyzer" = String, Path, description = "Analyzer name, e.g. eslint or accessibility")
  ),
  responses(
    (status = 200, description = "Analysis report", body = AnalysisReport),
    (status = 400, description = "No code submitted", body = ErrorResponse),
    (status = 404, description = "Unknown analyzer", body = UnknownAnalyzerResponse),
    (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
    (status = 500, description = "Analysis failed", body = ErrorResponse)
  )
)]
pub async fn analyze(
  State(state): State<Arc<AppState>>,
  Path(analyzer_name): Path<String>,
  headers: HeaderMap,
  jar: CookieJar,
  Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, Response> {
  let dev = state.settings.development;

  let analyzer = {
    let registry = state.analyzers.read().await;
    match registry.get(&analyzer_name) {
      Some(analyzer) => analyzer,
      None => {
        return Err(
          (
            StatusCode::NOT_FOUND,
            Json(UnknownAnalyzerResponse {
              error: format!("Analyzer '{}' not available", analyzer_name),
              error_type: "NOT_FOUND".to_string(),
              available_analyzers: registry.names(),
            }),
          )
            .into_response(),
        );
      }
    }
  };

  let code = body
    .code
    .filter(|c| !c.trim().is_empty())
    .ok_or_else(|| bad_request("Code is required").into_response())?;

  let options = body.options;
  let report = {
    let code = code.clone();
    let options = options.clone();
    tokio::task::spawn_blocking(move || analyzer.analyze(&code, &options))
      .await
      .map_err(|e| internal_error("Analysis failed", e, dev).into_response())?
  };

  tracing::info!(
    analyzer = %report.analyzer,
    score = report.score,
    issues = report.issues.len(),
    "Analysis complete"
  );

  if let Some(db) = &state.db {
    if let Ok(user_id) = current_user(&state, &headers, &jar).await {
      let recorded = match serde_json::to_string(&report) {
        Ok(result) => db
          .insert_history(
            Some(&user_id),
            &sha256_hex(&code),
            &options.analysis_types.join(","),
            &report.analyzer,
            &result,
          )
          .await
          .map(|_| ()),
        Err(e) => Err(e.into()),
      };
      if let Err(e) = recorded {
        tracing::error!(user_id = %user_id, "Failed to record analysis history: {}", e);
      }
    }
  }

  Ok(Json(report))
}
