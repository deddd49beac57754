use std::cmp::Ordering;

use compass_core::{
    CompetitionLevel, MarketSaturation, MarketSnapshot, ScoredBusiness, ScoringConfig,
};

use crate::round1;

pub const LOW_ADOPTION_GAP: &str = "Low website adoption - opportunity for web development services";
pub const REPUTATION_GAP: &str =
    "Below-average customer ratings - opportunity for reputation management services";
pub const WEBSITE_REPAIR_GAP: &str =
    "Many existing websites are failing - opportunity for website repair and maintenance";
pub const SOCIAL_MEDIA_GAP: &str =
    "Limited social media presence - opportunity for social media marketing";

/// Market-level statistics over a scored result set.
///
/// An empty input yields zero rates, low saturation and competition, no
/// competitors and no gaps.
#[must_use]
pub fn aggregate(scored: &[ScoredBusiness], config: &ScoringConfig) -> MarketSnapshot {
    let thresholds = &config.market;
    let total = scored.len();
    if total == 0 {
        return MarketSnapshot {
            market_saturation: MarketSaturation::Low,
            website_adoption_rate: 0.0,
            average_rating: 0.0,
            competition_level: CompetitionLevel::Low,
            opportunity_score: 0,
            top_competitors: Vec::new(),
            market_gaps: Vec::new(),
        };
    }

    let with_website: Vec<&ScoredBusiness> = scored
        .iter()
        .filter(|b| b.candidate.has_website())
        .collect();
    let adoption = round1(percentage(with_website.len(), total));

    let ratings: Vec<f64> = scored
        .iter()
        .filter_map(|b| b.candidate.effective_rating())
        .collect();
    let average_rating = mean(&ratings).map_or(0.0, round1);

    let market_saturation = if total > thresholds.saturation_high_count {
        MarketSaturation::High
    } else if total > thresholds.saturation_medium_count {
        MarketSaturation::Medium
    } else {
        MarketSaturation::Low
    };

    let competition_level = if average_rating > thresholds.high_competition_rating
        && adoption > thresholds.high_competition_adoption
    {
        CompetitionLevel::High
    } else if average_rating > thresholds.medium_competition_rating
        || adoption > thresholds.medium_competition_adoption
    {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::Low
    };

    let mut opportunity: i32 = 100;
    if adoption > thresholds.saturated_adoption {
        opportunity -= i32::from(thresholds.saturated_adoption_penalty);
    }
    if average_rating > thresholds.top_rated_average {
        opportunity -= i32::from(thresholds.top_rated_penalty);
    }
    if total > thresholds.crowded_count {
        opportunity -= i32::from(thresholds.crowded_penalty);
    }
    let opportunity_score = u8::try_from(opportunity.clamp(0, 100)).unwrap_or(0);

    let mut market_gaps = Vec::new();
    if adoption < thresholds.low_adoption_gap {
        market_gaps.push(LOW_ADOPTION_GAP.to_string());
    }
    if !ratings.is_empty() && average_rating < thresholds.poor_rating_gap {
        market_gaps.push(REPUTATION_GAP.to_string());
    }
    if !with_website.is_empty() {
        let failing = with_website
            .iter()
            .filter(|b| !b.website_status.is_accessible())
            .count();
        if percentage(failing, with_website.len()) > thresholds.broken_site_gap_share {
            market_gaps.push(WEBSITE_REPAIR_GAP.to_string());
        }
    }
    let with_social = scored
        .iter()
        .filter(|b| b.candidate.has_social_presence())
        .count();
    if percentage(with_social, total) < thresholds.limited_social_gap_share {
        market_gaps.push(SOCIAL_MEDIA_GAP.to_string());
    }

    MarketSnapshot {
        market_saturation,
        website_adoption_rate: adoption,
        average_rating,
        competition_level,
        opportunity_score,
        top_competitors: top_competitors(scored, thresholds.top_competitors),
        market_gaps,
    }
}

/// Highest `rating × rating_count` first; ties broken by name.
fn top_competitors(scored: &[ScoredBusiness], limit: usize) -> Vec<ScoredBusiness> {
    let weight = |b: &ScoredBusiness| {
        b.candidate.effective_rating().unwrap_or(0.0) * f64::from(b.candidate.reviews())
    };

    let mut ranked: Vec<&ScoredBusiness> = scored.iter().collect();
    ranked.sort_by(|a, b| {
        weight(b)
            .partial_cmp(&weight(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.candidate.name.cmp(&b.candidate.name))
    });
    ranked.into_iter().take(limit).cloned().collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
