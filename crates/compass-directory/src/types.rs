//! Wire types for the place-search provider and the geocoder.

use serde::{Deserialize, Serialize};

/// Body of `POST {base}/search`.
#[derive(Debug, Serialize)]
pub struct PlaceSearchRequest<'a> {
    pub q: &'a str,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ll: Option<String>,
    pub hl: &'a str,
    pub gl: &'a str,
    pub extra: bool,
}

/// Envelope returned by the provider. A missing `data` key means no results.
#[derive(Debug, Deserialize)]
pub struct PlaceSearchResponse {
    #[serde(default)]
    pub data: Vec<RawPlace>,
}

/// One place record as the provider sends it. Every field is optional on
/// the wire; normalisation decides what a usable candidate looks like.
#[derive(Debug, Default, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub cid: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Comma-separated category list, e.g. `"Dentist, Cosmetic dentist"`.
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    /// Either an ordinal number or a run of `$` signs.
    #[serde(default)]
    pub price_level: Option<serde_json::Value>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Comma-separated fallback list used when `phone` is empty.
    #[serde(default)]
    pub phones: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// A single string, a list of lines, or a day-to-hours map.
    #[serde(default)]
    pub opening_hours: Option<serde_json::Value>,
    #[serde(default)]
    pub emails: Option<Vec<String>>,
    #[serde(default)]
    pub facebook_links: Option<Vec<String>>,
    #[serde(default)]
    pub instagram_links: Option<Vec<String>>,
    #[serde(default)]
    pub linkedin_links: Option<Vec<String>>,
    #[serde(default)]
    pub twitter_links: Option<Vec<String>>,
    #[serde(default)]
    pub youtube_links: Option<Vec<String>>,
    #[serde(default)]
    pub yelp_links: Option<Vec<String>>,
}

/// One hit from a Nominatim-compatible `/search?format=json` response.
/// Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
pub struct GeocodeHit {
    pub lat: String,
    pub lon: String,
}
