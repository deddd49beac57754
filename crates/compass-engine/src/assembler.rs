//! Tiering and the response envelope.

use compass_core::{AppConfig, MarketSnapshot, ScoredBusiness, ScoringConfig};
use compass_scoring::round1;
use serde::{Deserialize, Serialize};

/// How many results each access level sees and what an upgrade costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPolicy {
    pub free_limit: usize,
    pub paid_limit: usize,
    pub upgrade_price: f64,
    /// Lead scores above this count towards `high_opportunity_count`.
    pub high_opportunity_score: u8,
}

impl TierPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig, scoring: &ScoringConfig) -> Self {
        Self {
            free_limit: config.free_result_limit,
            paid_limit: config.paid_result_limit,
            upgrade_price: config.upgrade_price,
            high_opportunity_score: scoring.high_opportunity_score,
        }
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            free_limit: 5,
            paid_limit: 20,
            upgrade_price: 20.0,
            high_opportunity_score: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStatistics {
    pub total_businesses: usize,
    pub businesses_with_websites: usize,
    pub accessible_websites: usize,
    pub no_website_count: usize,
    pub website_percentage: f64,
    /// Share of the businesses with a website whose site is accessible.
    pub accessible_percentage: f64,
    pub average_rating: f64,
    pub high_opportunity_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_analysis: Option<MarketSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub is_free_user: bool,
    pub total_found: usize,
    pub showing: usize,
    pub remaining: usize,
    pub upgrade_price: f64,
    /// `null` for subscribed callers.
    pub searches_remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub businesses: Vec<ScoredBusiness>,
    pub statistics: SearchStatistics,
    pub payment_info: PaymentInfo,
}

/// The caller's access level for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub subscribed: bool,
    pub searches_remaining: Option<u32>,
}

/// Statistics over the full post-filter result set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn statistics(scored: &[ScoredBusiness], high_opportunity_score: u8) -> SearchStatistics {
    let total = scored.len();
    let with_websites = scored.iter().filter(|b| b.candidate.has_website()).count();
    let accessible = scored
        .iter()
        .filter(|b| b.website_status.is_accessible())
        .count();

    let ratings: Vec<f64> = scored
        .iter()
        .filter_map(|b| b.candidate.effective_rating())
        .collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        round1(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let percent = |part: usize, whole: usize| {
        if whole == 0 {
            0.0
        } else {
            round1(part as f64 / whole as f64 * 100.0)
        }
    };

    SearchStatistics {
        total_businesses: total,
        businesses_with_websites: with_websites,
        accessible_websites: accessible,
        no_website_count: total - with_websites,
        website_percentage: percent(with_websites, total),
        accessible_percentage: percent(accessible, with_websites),
        average_rating,
        high_opportunity_count: scored
            .iter()
            .filter(|b| b.lead_score > high_opportunity_score)
            .count(),
        market_analysis: None,
    }
}

/// Builds the envelope for one caller.
///
/// `scored` must already be filtered. Unsubscribed callers never receive a
/// market snapshot, even if one is passed in.
#[must_use]
pub fn assemble(
    scored: &[ScoredBusiness],
    market: Option<MarketSnapshot>,
    access: Access,
    policy: &TierPolicy,
) -> SearchResponse {
    let mut statistics = statistics(scored, policy.high_opportunity_score);
    let total_found = scored.len();

    let (limit, searches_remaining) = if access.subscribed {
        statistics.market_analysis = market;
        (policy.paid_limit, None)
    } else {
        (policy.free_limit, access.searches_remaining)
    };

    let businesses: Vec<ScoredBusiness> = scored.iter().take(limit).cloned().collect();
    let showing = businesses.len();
    let remaining = if access.subscribed {
        0
    } else {
        total_found - showing
    };

    SearchResponse {
        businesses,
        statistics,
        payment_info: PaymentInfo {
            is_free_user: !access.subscribed,
            total_found,
            showing,
            remaining,
            upgrade_price: policy.upgrade_price,
            searches_remaining,
        },
    }
}
