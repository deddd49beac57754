mod check;
mod search;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use compass_directory::Directory;
use compass_engine::{SearchEngine, SearchError};
use compass_probe::SiteProber;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{client_identity, enforce_rate_limit, request_id, RateLimitState, RequestId};

pub struct AppState<D, P> {
    pub engine: Arc<SearchEngine<D, P>>,
}

impl<D, P> Clone for AppState<D, P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Error envelope. `error` is the human-readable message; the hints sit
/// beside it so clients can branch without digging into a nested object.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(rename = "requiresSubscription", skip_serializing_if = "Option::is_none")]
    pub requires_subscription: Option<bool>,
    #[serde(rename = "retryAfterSecs", skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            requires_subscription: None,
            retry_after_secs: None,
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// Maps a search failure onto a stable error code. Provider details stay
    /// in the server log.
    pub fn from_search_error(request_id: String, error: &SearchError) -> Self {
        match error {
            SearchError::Validation(message) => {
                Self::new(request_id, "validation_error", message.clone())
            }
            SearchError::RateLimited { retry_after_secs } => {
                let mut api_error = Self::new(request_id, "rate_limited", error.to_string());
                api_error.retry_after_secs = Some(*retry_after_secs);
                api_error
            }
            SearchError::QuotaExceeded => {
                let mut api_error = Self::new(request_id, "quota_exceeded", error.to_string());
                api_error.requires_subscription = Some(true);
                api_error
            }
            SearchError::Provider(e) => {
                tracing::error!(error = %e, "search failed at directory provider");
                Self::new(
                    request_id,
                    "provider_error",
                    "failed to search for businesses",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "quota_exceeded" => StatusCode::PAYMENT_REQUIRED,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let retry_after = self.retry_after_secs;
        let mut res = (status, Json(self)).into_response();
        if let Some(secs) = retry_after {
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        res
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app<D, P>(state: AppState<D, P>, check_limit: RateLimitState) -> Router
where
    D: Directory + 'static,
    P: SiteProber + 'static,
{
    let check_routes = Router::new()
        .route(
            "/api/v1/check-website",
            post(check::check_website::<D, P>),
        )
        .layer(axum::middleware::from_fn_with_state(
            check_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/search", post(search::search::<D, P>))
        .merge(check_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn(client_identity)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}
