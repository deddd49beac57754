//! Normalization of raw provider records into [`Candidate`]s.

use compass_core::{Candidate, GeoPoint, SocialProfiles};

use crate::types::{GeocodeHit, RawPlace};

/// Namespace prefix for every candidate id produced by this provider.
pub const PROVIDER_SCOPE: &str = "gmaps";

/// Converts one provider record into a [`Candidate`].
///
/// Returns `None` when the record carries neither a `place_id` nor a `cid`,
/// since such a record cannot be identified across searches.
#[must_use]
pub fn normalize_place(raw: RawPlace) -> Option<Candidate> {
    let place_id = non_empty(raw.place_id).or_else(|| raw.cid.as_ref().and_then(cid_string))?;

    let location = match (raw.latitude, raw.longitude) {
        (Some(lat), Some(lng)) if lat != 0.0 || lng != 0.0 => Some(GeoPoint { lat, lng }),
        _ => None,
    };

    let phone = non_empty(raw.phone).or_else(|| {
        raw.phones.as_deref().and_then(|list| {
            list.split(',')
                .map(str::trim)
                .find(|p| !p.is_empty())
                .map(ToOwned::to_owned)
        })
    });

    let social_profiles = SocialProfiles {
        facebook: links(raw.facebook_links),
        instagram: links(raw.instagram_links),
        linkedin: links(raw.linkedin_links),
        twitter: links(raw.twitter_links),
        youtube: links(raw.youtube_links),
        yelp: links(raw.yelp_links),
    };

    Some(Candidate {
        id: format!("{PROVIDER_SCOPE}:{place_id}"),
        name: non_empty(raw.name).unwrap_or_else(|| "Unknown Business".to_string()),
        address: raw.full_address.unwrap_or_default().trim().to_string(),
        location,
        categories: split_categories(raw.categories.as_deref()),
        rating: raw.average_rating.filter(|r| r.is_finite() && *r > 0.0),
        rating_count: raw.review_count,
        price_level: raw.price_level.as_ref().and_then(price_level),
        phone,
        website: clean_website(raw.website.as_deref()),
        hours: opening_hours(raw.opening_hours.as_ref()),
        emails: links(raw.emails),
        social_profiles,
    })
}

/// Splits a comma-separated category string, trimming and dropping blanks.
#[must_use]
pub fn split_categories(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Treats empty and `N/A` website values as absent.
#[must_use]
pub fn clean_website(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }
    Some(trimmed.to_string())
}

/// Map zoom level for a search radius in metres.
#[must_use]
pub fn zoom_for_radius(radius_m: u32) -> u8 {
    match radius_m {
        0..=2_000 => 14,
        2_001..=5_000 => 13,
        5_001..=10_000 => 12,
        10_001..=25_000 => 11,
        25_001..=50_000 => 10,
        _ => 9,
    }
}

/// Formats the provider viewport parameter, e.g. `@30.2672,-97.7431,11z`.
#[must_use]
pub fn viewport(point: GeoPoint, radius_m: u32) -> String {
    format!("@{},{},{}z", point.lat, point.lng, zoom_for_radius(radius_m))
}

/// Parses the first geocoder hit into a point; `None` if absent or malformed.
#[must_use]
pub fn parse_geocode_hit(hits: &[GeocodeHit]) -> Option<GeoPoint> {
    let hit = hits.first()?;
    let lat = hit.lat.trim().parse::<f64>().ok()?;
    let lng = hit.lon.trim().parse::<f64>().ok()?;
    Some(GeoPoint { lat, lng })
}

/// Trimmed, non-blank entries of an optional list, first occurrence kept.
fn links(values: Option<Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.unwrap_or_default() {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn cid_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn price_level(value: &serde_json::Value) -> Option<u8> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.chars().all(|c| c == '$') {
                u8::try_from(s.len()).ok()
            } else {
                s.parse::<u8>().ok()
            }
        }
        _ => None,
    }
}

fn opening_hours(value: Option<&serde_json::Value>) -> Vec<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        Some(serde_json::Value::Object(days)) => days
            .iter()
            .map(|(day, hours)| match hours {
                serde_json::Value::String(h) => format!("{day}: {h}"),
                serde_json::Value::Array(parts) => {
                    let joined = parts
                        .iter()
                        .filter_map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{day}: {joined}")
                }
                other => format!("{day}: {other}"),
            })
            .collect(),
        _ => Vec::new(),
    }
}
