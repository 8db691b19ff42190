use axum::{
  extract::State,
  http::{HeaderMap, StatusCode},
  Json,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::helpers::{clear_session_cookie, current_user, session_token, set_session_cookie};
use crate::api::common::{auth_error, ApiError, ErrorResponse, SuccessResponse};
use crate::auth::AuthError;
use crate::AppState;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  success: bool,
  session_token: String,
  expires_at: DateTime<Utc>,
  message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheckResponse {
  authenticated: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  user_id: Option<String>,
}

#[utoipa::path(
  post,
  path = "/auth/login",
  tag = "Auth",
  request_body = LoginRequest,
  responses(
    (status = 200, description = "Session created", body = LoginResponse),
    (status = 400, description = "Username or password missing", body = ErrorResponse),
    (status = 401, description = "Invalid credentials", body = ErrorResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  )
)]
pub async fn login(
  State(state): State<Arc<AppState>>,
  jar: CookieJar,
  Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
  let session = state
    .authenticator
    .login(&body.username, &body.password)
    .await
    .map_err(|e| auth_error(e, state.settings.development))?;

  let jar = set_session_cookie(jar, &session.token, &state.settings);

  Ok((
    jar,
    Json(LoginResponse {
      success: true,
      session_token: session.token,
      expires_at: session.expires_at,
      message: "Login successful".to_string(),
    }),
  ))
}

#[utoipa::path(
  post,
  path = "/auth/logout",
  tag = "Auth",
  responses(
    (status = 200, description = "Session destroyed", body = SuccessResponse),
    (status = 500, description = "Internal server error", body = ErrorResponse)
  )
)]
pub async fn logout(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  jar: CookieJar,
) -> Result<(CookieJar, Json<SuccessResponse>), ApiError> {
  if let Some(token) = session_token(&headers, &jar) {
    state
      .authenticator
      .logout(&token)
      .await
      .map_err(|e| auth_error(e, state.settings.development))?;
  }

  Ok((
    clear_session_cookie(jar),
    Json(SuccessResponse::new("Logged out successfully")),
  ))
}

#[utoipa::path(
  get,
  path = "/auth/check",
  tag = "Auth",
  responses(
    (status = 200, description = "Whether the caller holds a live session", body = SessionCheckResponse)
  )
)]
pub async fn check(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  jar: CookieJar,
) -> Result<Json<SessionCheckResponse>, (StatusCode, Json<ErrorResponse>)> {
  match current_user(&state, &headers, &jar).await {
    Ok(user_id) => Ok(Json(SessionCheckResponse {
      authenticated: true,
      user_id: Some(user_id),
    })),
    Err(AuthError::Internal(e)) => Err(auth_error(
      AuthError::Internal(e),
      state.settings.development,
    )),
    Err(_) => Ok(Json(SessionCheckResponse {
      authenticated: false,
      user_id: None,
    })),
  }
}
