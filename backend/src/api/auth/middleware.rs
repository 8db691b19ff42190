use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::helpers::current_user;
use crate::api::common::{auth_error, ApiError};
use crate::AppState;

/// The authenticated admin, inserted into request extensions by
/// `require_session`
#[derive(Debug, Clone)]
pub struct AdminUser {
  pub user_id: String,
}

// Middleware for the admin and AI routing routes
pub async fn require_session(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  cookie_jar: CookieJar,
  mut request: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let user_id = current_user(&state, &headers, &cookie_jar)
    .await
    .map_err(|e| {
      tracing::debug!(path = %request.uri().path(), "Rejected admin request: {}", e);
      auth_error(e, state.settings.development)
    })?;

  request.extensions_mut().insert(AdminUser { user_id });
  Ok(next.run(request).await)
}
