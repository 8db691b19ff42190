//! Per-client sliding-window rate limiting for the analysis endpoints.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::api::common::ErrorResponse;

/// Remembers the instants of recent requests per client and refuses a request
/// once `max_requests` already fall inside the trailing window.
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    /// Key clients on the proxy-appended `X-Forwarded-For` hop instead of
    /// the socket peer
    trust_proxy: bool,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            trust_proxy: false,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Record a request at `now` if the client is under its limit. Refused
    /// requests are not recorded.
    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let timestamps = hits.entry(client.to_string()).or_default();

        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Forget clients whose every request has left the window
    pub fn purge_idle(&self, now: Instant) -> usize {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let before = hits.len();
        hits.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|&last| now.saturating_duration_since(last) < self.window)
        });
        before - hits.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Socket peer address, else `unknown`. Behind a trusted proxy the last
/// `X-Forwarded-For` hop (the one the proxy appended) wins; earlier entries
/// are client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
                .map(str::to_string)
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<SlidingWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer, limiter.trust_proxy);

    if limiter.check(&client) {
        return next.run(request).await;
    }

    tracing::warn!(client = %client, "Rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new(
            "Too many requests, please try again later.",
            "RATE_LIMITED",
        )),
    )
        .into_response()
}
