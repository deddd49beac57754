use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use compass_core::AppConfig;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Identity used for quota and rate-limit accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Per-client fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, RateLimitWindow>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateLimitOutcome {
    allowed: bool,
    remaining: usize,
    reset_after: Duration,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.check_rate_limit,
            Duration::from_secs(config.check_rate_window_secs),
        )
    }

    async fn admit(&self, client: &str, now: Instant) -> RateLimitOutcome {
        let mut clients = self.clients.lock().await;
        let window = clients
            .entry(client.to_string())
            .or_insert(RateLimitWindow {
                started_at: now,
                count: 0,
            });

        if now.saturating_duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(window.started_at));

        if window.count >= self.max_requests {
            return RateLimitOutcome {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        window.count += 1;
        RateLimitOutcome {
            allowed: true,
            remaining: self.max_requests - window.count,
            reset_after,
        }
    }

    /// Drops windows that have fully elapsed. Returns how many went.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, w| now.saturating_duration_since(w.started_at) < self.window);
        before - clients.len()
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: &'static str,
    code: &'static str,
    #[serde(rename = "retryAfterSecs")]
    retry_after_secs: u64,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Resolves the caller's [`ClientId`] and stores it as a request extension.
pub async fn client_identity(mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let id = client_id_from(req.headers(), peer);
    req.extensions_mut().insert(ClientId(id));
    next.run(req).await
}

/// Middleware enforcing the per-client request-per-window limit.
///
/// Every response carries `X-RateLimit-*` headers; refusals also carry
/// `Retry-After`.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ClientId>()
        .map_or_else(|| "unknown".to_string(), |c| c.0.clone());
    let outcome = rate_limit.admit(&client, Instant::now()).await;
    let reset_secs = ceil_secs(outcome.reset_after);

    let mut res = if outcome.allowed {
        next.run(req).await
    } else {
        tracing::debug!(client_id = %client, "check-website rate limit exceeded");
        let mut res = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: "rate limit exceeded",
                code: "rate_limited",
                retry_after_secs: reset_secs,
            }),
        )
            .into_response();
        res.headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(reset_secs));
        res
    };

    let headers = res.headers_mut();
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from(rate_limit.max_requests),
    );
    headers.insert("x-ratelimit-remaining", HeaderValue::from(outcome.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_secs));
    res
}

/// First `x-forwarded-for` entry, then `x-real-ip`, then the socket peer.
fn client_id_from(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    forwarded_for(headers)
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    Some(first.to_string())
}

fn header_value(headers: &HeaderMap, key: &str) -> Option<String> {
    let raw = headers.get(key)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > 64 {
        return None;
    }
    Some(raw.to_string())
}

fn ceil_secs(d: Duration) -> u64 {
    (d.as_secs() + u64::from(d.subsec_nanos() > 0)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn forwarded_for_wins_and_uses_first_hop() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_id_from(&map, None), "203.0.113.7");
    }

    #[test]
    fn real_ip_then_peer_then_unknown() {
        let map = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_id_from(&map, None), "198.51.100.2");

        let peer: SocketAddr = "192.0.2.10:55000".parse().unwrap();
        assert_eq!(client_id_from(&HeaderMap::new(), Some(peer)), "192.0.2.10");

        assert_eq!(client_id_from(&HeaderMap::new(), None), "unknown");
    }

    #[tokio::test]
    async fn limiter_refuses_after_max_requests() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        let t0 = Instant::now();

        let first = limiter.admit("c", t0).await;
        let second = limiter.admit("c", t0).await;
        let third = limiter.admit("c", t0 + Duration::from_secs(10)).await;

        assert!(first.allowed && second.allowed);
        assert_eq!(second.remaining, 0);
        assert!(!third.allowed);
        assert_eq!(third.reset_after, Duration::from_secs(50));
    }

    #[tokio::test]
    async fn limiter_tracks_clients_separately_and_resets() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.admit("a", t0).await.allowed);
        assert!(limiter.admit("b", t0).await.allowed);
        assert!(!limiter.admit("a", t0).await.allowed);
        assert!(
            limiter
                .admit("a", t0 + Duration::from_secs(60))
                .await
                .allowed
        );
    }

    #[tokio::test]
    async fn sweep_drops_elapsed_windows() {
        let limiter = RateLimitState::new(5, Duration::from_secs(60));
        let t0 = Instant::now();
        limiter.admit("old", t0).await;
        limiter.admit("new", t0 + Duration::from_secs(30)).await;

        assert_eq!(limiter.sweep(t0 + Duration::from_secs(61)).await, 1);
    }

    #[test]
    fn reset_seconds_round_up() {
        assert_eq!(ceil_secs(Duration::from_millis(1_500)), 2);
        assert_eq!(ceil_secs(Duration::ZERO), 1);
    }
}
