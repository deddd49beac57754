//! Tunable thresholds for business scoring and market aggregation.
//!
//! Every field has a default so a YAML file only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Points added to the opportunity score for each negative signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: u8,
    pub no_website: u8,
    pub broken_site: u8,
    pub placeholder_site: u8,
    pub no_tls: u8,
    pub slow_response: u8,
    pub no_rating: u8,
    pub poor_rating: u8,
    pub low_rating: u8,
    pub few_reviews: u8,
    pub some_reviews: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 10,
            no_website: 45,
            broken_site: 35,
            placeholder_site: 35,
            no_tls: 15,
            slow_response: 10,
            no_rating: 10,
            poor_rating: 15,
            low_rating: 8,
            few_reviews: 10,
            some_reviews: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketThresholds {
    pub saturation_medium_count: usize,
    pub saturation_high_count: usize,
    pub high_competition_rating: f64,
    pub high_competition_adoption: f64,
    pub medium_competition_rating: f64,
    pub medium_competition_adoption: f64,
    pub saturated_adoption: f64,
    pub top_rated_average: f64,
    pub crowded_count: usize,
    /// Opportunity points removed when adoption exceeds `saturated_adoption`.
    pub saturated_adoption_penalty: u8,
    /// Opportunity points removed when the average rating exceeds `top_rated_average`.
    pub top_rated_penalty: u8,
    /// Opportunity points removed when the result count exceeds `crowded_count`.
    pub crowded_penalty: u8,
    pub low_adoption_gap: f64,
    pub poor_rating_gap: f64,
    pub broken_site_gap_share: f64,
    /// Percentage of businesses with social profiles below which a gap is reported.
    pub limited_social_gap_share: f64,
    pub top_competitors: usize,
}

impl Default for MarketThresholds {
    fn default() -> Self {
        Self {
            saturation_medium_count: 20,
            saturation_high_count: 50,
            high_competition_rating: 4.2,
            high_competition_adoption: 70.0,
            medium_competition_rating: 3.8,
            medium_competition_adoption: 50.0,
            saturated_adoption: 80.0,
            top_rated_average: 4.5,
            crowded_count: 30,
            saturated_adoption_penalty: 30,
            top_rated_penalty: 20,
            crowded_penalty: 15,
            low_adoption_gap: 50.0,
            poor_rating_gap: 3.5,
            broken_site_gap_share: 30.0,
            limited_social_gap_share: 30.0,
            top_competitors: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub slow_response_ms: u64,
    /// Ratings below this earn reputation recommendations.
    pub low_rating: f64,
    /// Ratings below this are penalised more heavily.
    pub poor_rating: f64,
    pub few_reviews: u32,
    pub some_reviews: u32,
    pub medium_business_reviews: u32,
    pub large_business_reviews: u32,
    pub established_reviews: u32,
    pub high_opportunity_score: u8,
    pub market: MarketThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            slow_response_ms: 3_000,
            low_rating: 4.0,
            poor_rating: 3.5,
            few_reviews: 10,
            some_reviews: 50,
            medium_business_reviews: 50,
            large_business_reviews: 200,
            established_reviews: 50,
            high_opportunity_score: 70,
            market: MarketThresholds::default(),
        }
    }
}

/// Load scoring thresholds from a YAML file, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scoring_config(path: Option<&Path>) -> Result<ScoringConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ScoringConfig::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ScoringFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: ScoringConfig = serde_yaml::from_str(&content)?;
    validate_scoring_config(&config)?;
    Ok(config)
}

fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    if config.poor_rating > config.low_rating {
        return Err(ConfigError::Validation(format!(
            "poor_rating ({}) must not exceed low_rating ({})",
            config.poor_rating, config.low_rating
        )));
    }
    if config.few_reviews > config.some_reviews {
        return Err(ConfigError::Validation(format!(
            "few_reviews ({}) must not exceed some_reviews ({})",
            config.few_reviews, config.some_reviews
        )));
    }
    if config.medium_business_reviews > config.large_business_reviews {
        return Err(ConfigError::Validation(format!(
            "medium_business_reviews ({}) must not exceed large_business_reviews ({})",
            config.medium_business_reviews, config.large_business_reviews
        )));
    }
    if config.high_opportunity_score > 100 {
        return Err(ConfigError::Validation(
            "high_opportunity_score must be within 0..=100".to_string(),
        ));
    }

    let market = &config.market;
    if market.saturation_medium_count > market.saturation_high_count {
        return Err(ConfigError::Validation(format!(
            "market.saturation_medium_count ({}) must not exceed market.saturation_high_count ({})",
            market.saturation_medium_count, market.saturation_high_count
        )));
    }
    if market.medium_competition_rating > market.high_competition_rating {
        return Err(ConfigError::Validation(
            "market.medium_competition_rating must not exceed market.high_competition_rating"
                .to_string(),
        ));
    }
    if market.top_competitors == 0 {
        return Err(ConfigError::Validation(
            "market.top_competitors must be at least 1".to_string(),
        ));
    }

    Ok(())
}
