use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::probe::ProbeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitalPresence {
    Strong,
    Moderate,
    Weak,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInsights {
    pub digital_presence: DigitalPresence,
    pub business_size: BusinessSize,
    pub estimated_age: String,
    pub recommended_services: Vec<String>,
}

/// A candidate with its probe outcome and the derived opportunity profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBusiness {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub website_status: ProbeResult,
    /// Opportunity score in `[0, 100]`; higher means more room for digital services.
    pub lead_score: u8,
    pub business_insights: BusinessInsights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSaturation {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_saturation: MarketSaturation,
    pub website_adoption_rate: f64,
    pub average_rating: f64,
    pub competition_level: CompetitionLevel,
    pub opportunity_score: u8,
    pub top_competitors: Vec<ScoredBusiness>,
    pub market_gaps: Vec<String>,
}
