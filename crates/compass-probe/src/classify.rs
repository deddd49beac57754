//! Classification of probe failures and fetched page content.

use std::error::Error as _;
use std::sync::LazyLock;

use compass_core::ProbeStatus;
use regex::Regex;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static PARKED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(domain\s+(name\s+)?(is\s+|may\s+be\s+)?for\s+sale|buy\s+this\s+domain|this\s+domain\s+has\s+been\s+registered|domain\s+parking|parked\s+(free|domain)|is\s+parked|sedoparking|parkingcrew|hugedomains)",
    )
    .expect("valid parked regex")
});
static UNDER_CONSTRUCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(under\s+construction|coming\s+soon|launching\s+soon|(site|website)\s+is\s+being\s+built|welcome\s+to\s+nginx|default\s+web\s+page|future\s+home\s+of)",
    )
    .expect("valid under-construction regex")
});

const PARKING_HOSTS: &[&str] = &[
    "sedoparking.com",
    "parkingcrew.net",
    "bodis.com",
    "afternic.com",
    "hugedomains.com",
    "dan.com",
];

const TITLE_MAX_CHARS: usize = 200;

/// Whether `host` belongs to a known domain-parking service.
#[must_use]
pub fn is_parking_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    PARKING_HOSTS
        .iter()
        .any(|p| host == *p || host.ends_with(&format!(".{p}")))
}

/// Extracts and tidies the `<title>` of an HTML document.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let decoded = raw
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ");
    let collapsed = WHITESPACE_RE.replace_all(decoded.trim(), " ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(TITLE_MAX_CHARS).collect())
}

/// Classifies a 2xx page from its final host and (possibly truncated) body.
///
/// Parking hosts and parked patterns win over under-construction patterns.
#[must_use]
pub fn classify_page(host: Option<&str>, body: &str) -> ProbeStatus {
    if host.is_some_and(is_parking_host) || PARKED_RE.is_match(body) {
        ProbeStatus::ParkedDomain
    } else if UNDER_CONSTRUCTION_RE.is_match(body) {
        ProbeStatus::UnderConstruction
    } else {
        ProbeStatus::Accessible
    }
}

/// Maps a transport error onto a probe classification.
#[must_use]
pub fn classify_transport_error(error: &reqwest::Error) -> ProbeStatus {
    if error.is_timeout() {
        return ProbeStatus::Timeout;
    }
    if is_tls_failure(error) {
        return ProbeStatus::TlsError;
    }
    ProbeStatus::ConnectionError
}

/// Renders an error with its full source chain, e.g. for the probe detail.
#[must_use]
pub fn error_chain(error: &reqwest::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = inner.source();
    }
    out
}

/// Whether any error in the source chain was raised by the TLS stack.
///
/// `std::io::Error` hides a wrapped error from `source()`, so io errors are
/// unwrapped with `get_ref()` as well.
#[must_use]
pub fn is_tls_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(inner) = current {
        if inner.is::<rustls::Error>() {
            return true;
        }
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|wrapped| wrapped.is::<rustls::Error>()) {
                return true;
            }
        }
        current = inner.source();
    }
    false
}
