use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Social profile links the provider attached to a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialProfiles {
    pub facebook: Vec<String>,
    pub instagram: Vec<String>,
    pub linkedin: Vec<String>,
    pub twitter: Vec<String>,
    pub youtube: Vec<String>,
    pub yelp: Vec<String>,
}

impl SocialProfiles {
    /// Number of networks with at least one link.
    #[must_use]
    pub fn network_count(&self) -> usize {
        [
            &self.facebook,
            &self.instagram,
            &self.linkedin,
            &self.twitter,
            &self.youtube,
            &self.yelp,
        ]
        .iter()
        .filter(|links| !links.is_empty())
        .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.network_count() == 0
    }
}

/// One business returned by the directory provider for a search.
///
/// `id` is namespaced by provider (`gmaps:<place_id>`) so candidates from
/// different providers never share an identifier space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: Option<GeoPoint>,
    pub categories: Vec<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub price_level: Option<u8>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default, skip_serializing_if = "SocialProfiles::is_empty")]
    pub social_profiles: SocialProfiles,
}

impl Candidate {
    #[must_use]
    pub fn has_website(&self) -> bool {
        self.website.is_some()
    }

    /// Rating treated as absent when the provider reports `0`.
    #[must_use]
    pub fn effective_rating(&self) -> Option<f64> {
        self.rating.filter(|r| *r > 0.0)
    }

    #[must_use]
    pub fn has_email(&self) -> bool {
        !self.emails.is_empty()
    }

    #[must_use]
    pub fn has_social_presence(&self) -> bool {
        !self.social_profiles.is_empty()
    }

    #[must_use]
    pub fn reviews(&self) -> u32 {
        self.rating_count.unwrap_or(0)
    }
}
