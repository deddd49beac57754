//! Search request parsing, validation and normalization.

use compass_core::{AppConfig, ScoredBusiness};
use compass_directory::DirectoryQuery;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

const MAX_TEXT_CHARS: usize = 200;
const MAX_RADIUS_M: u32 = 50_000;

/// Search parameters as the client sends them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "radius")]
    pub radius_meters: Option<u32>,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Keep only businesses without a website.
    #[serde(default)]
    pub filter_no_website: bool,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub min_lead_score: Option<u8>,
}

/// Defaults and bounds applied while normalizing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub default_radius_m: u32,
    pub default_max_results: u32,
    pub max_results_cap: u32,
}

impl RequestLimits {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            default_radius_m: config.default_radius_m,
            default_max_results: config.default_max_results,
            max_results_cap: config.max_results_cap,
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            default_radius_m: 15_000,
            default_max_results: 10,
            max_results_cap: 20,
        }
    }
}

/// Result filters, applied to the full scored set before tiering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchFilters {
    pub no_website_only: bool,
    pub min_rating: Option<f64>,
    pub min_lead_score: Option<u8>,
}

impl SearchFilters {
    #[must_use]
    pub fn matches(&self, business: &ScoredBusiness) -> bool {
        if self.no_website_only && business.candidate.has_website() {
            return false;
        }
        if let Some(min) = self.min_rating {
            if business.candidate.effective_rating().unwrap_or(0.0) < min {
                return false;
            }
        }
        if let Some(min) = self.min_lead_score {
            if business.lead_score < min {
                return false;
            }
        }
        true
    }

    #[must_use]
    pub fn apply(&self, businesses: Vec<ScoredBusiness>) -> Vec<ScoredBusiness> {
        businesses.into_iter().filter(|b| self.matches(b)).collect()
    }
}

/// A validated search with defaults applied and text whitespace-collapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSearch {
    pub query: String,
    pub location: String,
    pub radius_m: u32,
    pub max_results: u32,
    pub filters: SearchFilters,
    pub user_id: Option<String>,
}

impl SearchRequest {
    /// # Errors
    ///
    /// Returns [`SearchError::Validation`] for missing query or location,
    /// out-of-range radius, zero result count, or out-of-range filters.
    pub fn normalize(&self, limits: &RequestLimits) -> Result<NormalizedSearch, SearchError> {
        let query = collapse_whitespace(&self.query);
        let location = collapse_whitespace(&self.location);

        if query.is_empty() || location.is_empty() {
            return Err(SearchError::Validation(
                "query and location are required".to_string(),
            ));
        }
        if query.chars().count() > MAX_TEXT_CHARS || location.chars().count() > MAX_TEXT_CHARS {
            return Err(SearchError::Validation(format!(
                "query and location must be at most {MAX_TEXT_CHARS} characters"
            )));
        }

        let radius_m = self.radius_meters.unwrap_or(limits.default_radius_m);
        if radius_m == 0 || radius_m > MAX_RADIUS_M {
            return Err(SearchError::Validation(format!(
                "radiusMeters must be between 1 and {MAX_RADIUS_M}"
            )));
        }

        let max_results = self.max_results.unwrap_or(limits.default_max_results);
        if max_results == 0 {
            return Err(SearchError::Validation(
                "maxResults must be at least 1".to_string(),
            ));
        }
        let max_results = max_results.min(limits.max_results_cap);

        let min_rating = match self.min_rating {
            Some(r) if !r.is_finite() || !(0.0..=5.0).contains(&r) => {
                return Err(SearchError::Validation(
                    "minRating must be between 0 and 5".to_string(),
                ));
            }
            Some(r) if r > 0.0 => Some(r),
            _ => None,
        };

        let min_lead_score = match self.min_lead_score {
            Some(s) if s > 100 => {
                return Err(SearchError::Validation(
                    "minLeadScore must be between 0 and 100".to_string(),
                ));
            }
            Some(s) if s > 0 => Some(s),
            _ => None,
        };

        Ok(NormalizedSearch {
            query,
            location,
            radius_m,
            max_results,
            filters: SearchFilters {
                no_website_only: self.filter_no_website,
                min_rating,
                min_lead_score,
            },
            user_id: self
                .user_id
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(ToOwned::to_owned),
        })
    }
}

impl NormalizedSearch {
    /// Canonical cache key. Case-insensitive on text, independent of the
    /// caller, and unambiguous because it is a JSON tuple.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let key = (
            self.query.to_lowercase(),
            self.location.to_lowercase(),
            self.radius_m,
            self.max_results,
            self.filters.no_website_only,
            self.filters.min_rating,
            self.filters.min_lead_score,
        );
        serde_json::to_string(&key).unwrap_or_else(|_| format!("{key:?}"))
    }

    #[must_use]
    pub fn directory_query(&self) -> DirectoryQuery {
        DirectoryQuery {
            query: self.query.clone(),
            location: self.location.clone(),
            radius_m: self.radius_m,
            max_results: self.max_results,
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
