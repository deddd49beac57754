//! HTTP client for the place-search provider and its geocoder.

use std::time::Duration;

use compass_core::{AppConfig, Candidate, GeoPoint};
use reqwest::{Client, Url};

use crate::error::DirectoryError;
use crate::normalize::{normalize_place, parse_geocode_hit, viewport};
use crate::types::{GeocodeHit, PlaceSearchRequest, PlaceSearchResponse};
use crate::{Directory, DirectoryQuery};

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://cloud.gmapsextractor.com/api/v2";
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Client for the place-search provider.
///
/// Use [`DirectoryClient::new`] for production or
/// [`DirectoryClient::with_base_urls`] to point at mock servers in tests.
pub struct DirectoryClient {
    client: Client,
    api_key: String,
    search_url: Url,
    geocode_url: Url,
}

impl DirectoryClient {
    /// Creates a client pointed at the production provider and geocoder.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, DirectoryError> {
        Self::with_base_urls(
            api_key,
            timeout_secs,
            user_agent,
            DEFAULT_SEARCH_BASE_URL,
            DEFAULT_GEOCODER_BASE_URL,
        )
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Same as [`DirectoryClient::with_base_urls`].
    pub fn from_config(config: &AppConfig) -> Result<Self, DirectoryError> {
        Self::with_base_urls(
            &config.directory_api_key,
            config.directory_timeout_secs,
            &config.user_agent,
            &config.directory_base_url,
            &config.geocoder_base_url,
        )
    }

    /// Creates a client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`DirectoryError::InvalidBaseUrl`] if either URL is invalid.
    pub fn with_base_urls(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        search_base_url: &str,
        geocoder_base_url: &str,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            search_url: endpoint(search_base_url, "search")?,
            geocode_url: endpoint(geocoder_base_url, "search")?,
        })
    }

    /// Resolves a free-text location into coordinates.
    ///
    /// Returns `Ok(None)` when the geocoder has no match.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::Http`] on network failure.
    /// - [`DirectoryError::UnexpectedStatus`] on a non-2xx response.
    /// - [`DirectoryError::Deserialize`] if the body is not a hit list.
    pub async fn geocode(&self, location: &str) -> Result<Option<GeoPoint>, DirectoryError> {
        let mut url = self.geocode_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", location)
            .append_pair("limit", "1");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("geocode(location={location})"),
            });
        }

        let body = response.bytes().await?;
        let hits: Vec<GeocodeHit> =
            serde_json::from_slice(&body).map_err(|e| DirectoryError::Deserialize {
                context: format!("geocode(location={location})"),
                source: e,
            })?;

        Ok(parse_geocode_hit(&hits))
    }

    async fn search_places(
        &self,
        q: &str,
        ll: Option<String>,
    ) -> Result<Vec<Candidate>, DirectoryError> {
        let request = PlaceSearchRequest {
            q,
            page: 1,
            ll,
            hl: "en",
            gl: "us",
            extra: true,
        };

        let response = self
            .client
            .post(self.search_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: status.as_u16(),
                context: format!("search(q={q})"),
            });
        }

        let body = response.bytes().await?;
        let envelope: PlaceSearchResponse =
            serde_json::from_slice(&body).map_err(|e| DirectoryError::Deserialize {
                context: format!("search(q={q})"),
                source: e,
            })?;

        Ok(envelope
            .data
            .into_iter()
            .filter_map(normalize_place)
            .collect())
    }
}

impl Directory for DirectoryClient {
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<Candidate>, DirectoryError> {
        let point = match self.geocode(&query.location).await {
            Ok(Some(point)) => Some(point),
            Ok(None) => {
                tracing::warn!(
                    location = %query.location,
                    "geocoder returned no match; falling back to name-only search"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    location = %query.location,
                    error = %e,
                    "geocoding failed; falling back to name-only search"
                );
                None
            }
        };

        let (q, ll) = match point {
            Some(point) => (query.query.clone(), Some(viewport(point, query.radius_m))),
            None => (format!("{} in {}", query.query, query.location), None),
        };

        let mut candidates = self.search_places(&q, ll).await?;
        candidates.truncate(query.max_results as usize);

        tracing::debug!(
            query = %query.query,
            location = %query.location,
            count = candidates.len(),
            "directory search complete"
        );

        Ok(candidates)
    }
}

/// Joins `path` onto `base`, tolerating a trailing slash on `base`.
fn endpoint(base: &str, path: &str) -> Result<Url, DirectoryError> {
    let normalised = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&normalised)
        .and_then(|url| url.join(path))
        .map_err(|e| DirectoryError::InvalidBaseUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })
}
