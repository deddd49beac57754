use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a website probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeStatus {
    Accessible,
    Timeout,
    TlsError,
    RedirectLoop,
    ConnectionError,
    ParkedDomain,
    UnderConstruction,
    ContentError,
    NoWebsite,
}

impl ProbeStatus {
    /// The site exists but does not serve working content.
    #[must_use]
    pub fn is_broken(self) -> bool {
        matches!(
            self,
            ProbeStatus::Timeout
                | ProbeStatus::TlsError
                | ProbeStatus::RedirectLoop
                | ProbeStatus::ConnectionError
                | ProbeStatus::ContentError
        )
    }

    /// The site answers but only with a parking or placeholder page.
    #[must_use]
    pub fn is_placeholder(self) -> bool {
        matches!(
            self,
            ProbeStatus::ParkedDomain | ProbeStatus::UnderConstruction
        )
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProbeStatus::Accessible => "accessible",
            ProbeStatus::Timeout => "timeout",
            ProbeStatus::TlsError => "tls-error",
            ProbeStatus::RedirectLoop => "redirect-loop",
            ProbeStatus::ConnectionError => "connection-error",
            ProbeStatus::ParkedDomain => "parked-domain",
            ProbeStatus::UnderConstruction => "under-construction",
            ProbeStatus::ContentError => "content-error",
            ProbeStatus::NoWebsite => "no-website",
        };
        f.write_str(s)
    }
}

/// Outcome of checking one candidate's website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    /// A 2xx final response was received.
    pub reachable: bool,
    pub status_code: Option<u16>,
    /// Final URL after redirects was served over HTTPS.
    pub tls: bool,
    pub latency_ms: Option<u64>,
    pub redirect_count: u8,
    pub title: Option<String>,
    pub final_url: Option<String>,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ProbeResult {
    /// Result for a candidate that has no website; no network call is made.
    #[must_use]
    pub fn no_website() -> Self {
        Self {
            status: ProbeStatus::NoWebsite,
            reachable: false,
            status_code: None,
            tls: false,
            latency_ms: None,
            redirect_count: 0,
            title: None,
            final_url: None,
            error: Some("No website provided".to_string()),
            checked_at: Utc::now(),
        }
    }

    /// Result for a probe that failed before any response was received.
    #[must_use]
    pub fn failed(status: ProbeStatus, url: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            reachable: false,
            status_code: None,
            tls: false,
            latency_ms: None,
            redirect_count: 0,
            title: None,
            final_url: url,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.status == ProbeStatus::Accessible
    }
}
