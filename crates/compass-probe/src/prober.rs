//! HTTP website prober with manual redirect handling.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use compass_core::{AppConfig, ProbeResult, ProbeStatus};
use reqwest::{header, redirect, Client, Method, Response, StatusCode, Url};

use crate::classify::{classify_page, classify_transport_error, error_chain, extract_title};
use crate::error::ProbeError;
use crate::url::{http_fallback, normalize_url};
use crate::SiteProber;

/// Maximum redirect hops followed before a probe is classified as a loop.
pub const MAX_REDIRECTS: u8 = 10;

/// Upper bound on the bytes of a page body read for classification.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Bounded-time liveness and quality check for business websites.
///
/// Redirects are followed by hand so the hop count, final scheme and loops
/// are observable. A connection-level failure over HTTPS is retried exactly
/// once over plain HTTP.
pub struct WebsiteProbe {
    client: Client,
    timeout: Duration,
    max_redirects: u8,
}

impl WebsiteProbe {
    /// Creates a prober whose whole check, redirects and fallback included,
    /// is bounded by `timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ProbeError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_redirects: MAX_REDIRECTS,
        })
    }

    /// # Errors
    ///
    /// Same as [`WebsiteProbe::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ProbeError> {
        Self::new(config.probe_timeout_secs, &config.user_agent)
    }

    /// Checks one website. Never fails: every outcome is a classification.
    pub async fn check(&self, website: &str) -> ProbeResult {
        let url = match normalize_url(website) {
            Ok(url) => url,
            Err(e) => {
                return ProbeResult::failed(
                    ProbeStatus::ConnectionError,
                    Some(website.trim().to_string()),
                    e.to_string(),
                );
            }
        };

        let result = match tokio::time::timeout(self.timeout, self.check_with_fallback(&url)).await
        {
            Ok(result) => result,
            Err(_) => ProbeResult::failed(
                ProbeStatus::Timeout,
                Some(url.to_string()),
                format!("Request timed out after {}s", self.timeout.as_secs()),
            ),
        };

        tracing::debug!(
            url = %url,
            status = %result.status,
            latency_ms = ?result.latency_ms,
            redirects = result.redirect_count,
            "website probe complete"
        );
        result
    }

    async fn check_with_fallback(&self, url: &Url) -> ProbeResult {
        let primary = self.attempt(url.clone()).await;
        if primary.status != ProbeStatus::ConnectionError {
            return primary;
        }

        let Some(fallback) = http_fallback(url) else {
            return primary;
        };

        tracing::debug!(url = %url, "HTTPS connection failed; retrying over HTTP");
        let secondary = self.attempt(fallback).await;
        if secondary.status == ProbeStatus::ConnectionError {
            primary
        } else {
            secondary
        }
    }

    async fn attempt(&self, start: Url) -> ProbeResult {
        let started = Instant::now();
        let mut current = start;
        let mut visited: HashSet<String> = HashSet::from([current.to_string()]);
        let mut redirects: u8 = 0;
        let mut method = Method::HEAD;

        let response = loop {
            let response = match self
                .client
                .request(method.clone(), current.clone())
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => return self.transport_failure(&current, redirects, &e),
            };

            let status = response.status();
            if status.is_redirection() {
                if let Some(next) = redirect_target(&current, &response) {
                    redirects = redirects.saturating_add(1);
                    if redirects > self.max_redirects {
                        return redirect_loop(
                            &current,
                            redirects - 1,
                            format!("Exceeded {} redirects", self.max_redirects),
                        );
                    }
                    if !visited.insert(next.to_string()) {
                        return redirect_loop(&next, redirects, format!("Redirect loop at {next}"));
                    }
                    current = next;
                    continue;
                }
            }

            if method == Method::HEAD
                && matches!(
                    status,
                    StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
                )
            {
                method = Method::GET;
                continue;
            }

            break response;
        };

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status();
        let tls = current.scheme() == "https";

        if !status.is_success() {
            return ProbeResult {
                status: ProbeStatus::ContentError,
                reachable: false,
                status_code: Some(status.as_u16()),
                tls,
                latency_ms: Some(latency_ms),
                redirect_count: redirects,
                title: None,
                final_url: Some(current.to_string()),
                error: Some(format!("HTTP {}", status.as_u16())),
                checked_at: Utc::now(),
            };
        }

        let body = if method == Method::GET {
            read_bounded(response).await
        } else if looks_like_html(&response) {
            self.fetch_body(&current).await
        } else {
            None
        };

        let page = body.as_deref().unwrap_or_default();
        let classification = classify_page(current.host_str(), page);
        let error = match classification {
            ProbeStatus::ParkedDomain => Some("Domain appears to be parked or for sale".to_string()),
            ProbeStatus::UnderConstruction => {
                Some("Site appears to be under construction".to_string())
            }
            _ => None,
        };

        ProbeResult {
            status: classification,
            reachable: true,
            status_code: Some(status.as_u16()),
            tls,
            latency_ms: Some(latency_ms),
            redirect_count: redirects,
            title: extract_title(page),
            final_url: Some(current.to_string()),
            error,
            checked_at: Utc::now(),
        }
    }

    /// Bounded GET of a page body. Failures only cost the title and content
    /// classification, so they yield `None`.
    async fn fetch_body(&self, url: &Url) -> Option<String> {
        match self.client.get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => read_bounded(response).await,
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status().as_u16(), "body fetch returned non-2xx");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "body fetch failed");
                None
            }
        }
    }

    fn transport_failure(&self, url: &Url, redirects: u8, error: &reqwest::Error) -> ProbeResult {
        let status = classify_transport_error(error);
        let detail = match status {
            ProbeStatus::Timeout => {
                format!("Request timed out after {}s", self.timeout.as_secs())
            }
            ProbeStatus::TlsError => format!("TLS handshake failed: {}", error_chain(error)),
            _ => format!("Connection failed: {}", error_chain(error)),
        };

        ProbeResult {
            status,
            reachable: false,
            status_code: None,
            tls: false,
            latency_ms: None,
            redirect_count: redirects,
            title: None,
            final_url: Some(url.to_string()),
            error: Some(detail),
            checked_at: Utc::now(),
        }
    }
}

impl SiteProber for WebsiteProbe {
    async fn probe(&self, website: &str) -> ProbeResult {
        self.check(website).await
    }
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    current.join(location.trim()).ok()
}

fn redirect_loop(url: &Url, redirects: u8, detail: String) -> ProbeResult {
    ProbeResult {
        status: ProbeStatus::RedirectLoop,
        reachable: false,
        status_code: None,
        tls: url.scheme() == "https",
        latency_ms: None,
        redirect_count: redirects,
        title: None,
        final_url: Some(url.to_string()),
        error: Some(detail),
        checked_at: Utc::now(),
    }
}

/// HTML, or no declared content type at all.
fn looks_like_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| ct.to_ascii_lowercase().contains("html"))
}

async fn read_bounded(mut response: Response) -> Option<String> {
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() < BODY_LIMIT_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "body read interrupted");
                break;
            }
        }
    }
    if buf.is_empty() {
        return None;
    }
    buf.truncate(BODY_LIMIT_BYTES);
    Some(String::from_utf8_lossy(&buf).into_owned())
}
