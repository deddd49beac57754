use reqwest::Url;

use crate::error::ProbeError;

/// Normalizes a website value from a directory listing into a probe target.
///
/// Trims whitespace, defaults the scheme to `https://`, drops the query
/// string and fragment, and strips trailing slashes from the path.
///
/// # Errors
///
/// Returns [`ProbeError::InvalidUrl`] for empty input, non-HTTP schemes, or
/// values that do not parse as a URL with a host.
pub fn normalize_url(raw: &str) -> Result<Url, ProbeError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| ProbeError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }

    url.set_query(None);
    url.set_fragment(None);
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    Ok(url)
}

/// The same URL over plain HTTP, for the one-shot fallback after an HTTPS
/// connection failure. `None` if the URL is already HTTP.
#[must_use]
pub fn http_fallback(url: &Url) -> Option<Url> {
    if url.scheme() != "https" {
        return None;
    }
    let mut fallback = url.clone();
    fallback.set_scheme("http").ok()?;
    Some(fallback)
}
