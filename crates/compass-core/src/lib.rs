//! Shared domain types and configuration for Client Compass.

pub mod app_config;
pub mod business;
pub mod candidate;
pub mod config;
pub mod probe;
pub mod scoring_config;

pub use app_config::{AppConfig, Environment};
pub use business::{
    BusinessInsights, BusinessSize, CompetitionLevel, DigitalPresence, MarketSaturation,
    MarketSnapshot, ScoredBusiness,
};
pub use candidate::{Candidate, GeoPoint, SocialProfiles};
pub use config::{load_app_config, load_app_config_from_env};
pub use probe::{ProbeResult, ProbeStatus};
pub use scoring_config::{load_scoring_config, MarketThresholds, ScoringConfig, ScoringWeights};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read scoring config at {path}: {source}")]
    ScoringFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scoring config: {0}")]
    ScoringFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
