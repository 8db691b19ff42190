use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use time::Duration as TimeDuration;

use crate::auth::AuthError;
use crate::config::Settings;
use crate::AppState;

pub const SESSION_COOKIE: &str = "sessionToken";
pub const SESSION_HEADER: &str = "X-Session-Token";

/// Session token from `X-Session-Token`, then `Authorization: Bearer`, then
/// the session cookie
pub fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.trim().is_empty())
}

pub(crate) fn set_session_cookie(jar: CookieJar, token: &str, settings: &Settings) -> CookieJar {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_max_age(Some(TimeDuration::seconds(
        settings.session_ttl.num_seconds(),
    )));

    if settings.cookie_secure {
        cookie.set_secure(true);
    }

    jar.add(cookie)
}

pub(crate) fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    jar.remove(cookie)
}

/// Resolve the caller's user id from whichever token the request carries
pub async fn current_user(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Result<String, AuthError> {
    let token = session_token(headers, jar);
    state.authenticator.authenticate(token.as_deref()).await
}
