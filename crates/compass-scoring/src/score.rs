use compass_core::{
    BusinessInsights, BusinessSize, Candidate, DigitalPresence, ProbeResult, ProbeStatus,
    ScoredBusiness, ScoringConfig,
};

use crate::services::{recommend, Signals};

/// Scores one candidate against its probe result.
///
/// The lead score starts at the configured base and every negative signal
/// only ever adds its weight, so a business can never score lower by
/// looking worse. The total is clamped to `[0, 100]`.
#[must_use]
pub fn score(candidate: Candidate, probe: ProbeResult, config: &ScoringConfig) -> ScoredBusiness {
    let signals = signals(&candidate, &probe, config);
    let lead_score = lead_score(&signals, &candidate, config);

    let reviews = candidate.reviews();
    let business_insights = BusinessInsights {
        digital_presence: digital_presence(&signals, &probe),
        business_size: business_size(reviews, config),
        estimated_age: if reviews > config.established_reviews {
            "Established (5+ years)".to_string()
        } else {
            "Recent (1-5 years)".to_string()
        },
        recommended_services: recommend(&signals),
    };

    ScoredBusiness {
        candidate,
        website_status: probe,
        lead_score,
        business_insights,
    }
}

/// Scores candidates zipped with their probe results, preserving order.
#[must_use]
pub fn score_all(
    candidates: Vec<Candidate>,
    probes: Vec<ProbeResult>,
    config: &ScoringConfig,
) -> Vec<ScoredBusiness> {
    candidates
        .into_iter()
        .zip(probes)
        .map(|(candidate, probe)| score(candidate, probe, config))
        .collect()
}

fn signals(candidate: &Candidate, probe: &ProbeResult, config: &ScoringConfig) -> Signals {
    let has_website = candidate.has_website() && probe.status != ProbeStatus::NoWebsite;
    let accessible = has_website && probe.is_accessible();
    let slow = accessible
        && probe
            .latency_ms
            .is_some_and(|ms| ms > config.slow_response_ms);
    let missing_tls = has_website
        && (probe.status == ProbeStatus::TlsError
            || ((accessible || probe.status.is_placeholder()) && !probe.tls));

    Signals {
        has_website,
        broken_site: has_website && probe.status.is_broken(),
        placeholder_site: has_website && probe.status.is_placeholder(),
        missing_tls,
        slow,
        low_rating: candidate
            .effective_rating()
            .is_some_and(|r| r < config.low_rating),
        few_reviews: candidate.reviews() < config.few_reviews,
        has_email: candidate.has_email(),
        has_social: candidate.has_social_presence(),
        categories: candidate
            .categories
            .iter()
            .map(|c| c.to_lowercase())
            .collect(),
    }
}

fn lead_score(signals: &Signals, candidate: &Candidate, config: &ScoringConfig) -> u8 {
    let weights = &config.weights;
    let mut total = u32::from(weights.base);

    if !signals.has_website {
        total += u32::from(weights.no_website);
    } else if signals.broken_site {
        total += u32::from(weights.broken_site);
    } else if signals.placeholder_site {
        total += u32::from(weights.placeholder_site);
    } else {
        if signals.missing_tls {
            total += u32::from(weights.no_tls);
        }
        if signals.slow {
            total += u32::from(weights.slow_response);
        }
    }

    match candidate.effective_rating() {
        None => total += u32::from(weights.no_rating),
        Some(r) if r < config.poor_rating => total += u32::from(weights.poor_rating),
        Some(r) if r < config.low_rating => total += u32::from(weights.low_rating),
        Some(_) => {}
    }

    let reviews = candidate.reviews();
    if reviews < config.few_reviews {
        total += u32::from(weights.few_reviews);
    } else if reviews < config.some_reviews {
        total += u32::from(weights.some_reviews);
    }

    u8::try_from(total.min(100)).unwrap_or(100)
}

fn digital_presence(signals: &Signals, probe: &ProbeResult) -> DigitalPresence {
    if !signals.has_website {
        DigitalPresence::None
    } else if !probe.is_accessible() || !probe.tls {
        DigitalPresence::Weak
    } else if signals.slow {
        DigitalPresence::Moderate
    } else {
        DigitalPresence::Strong
    }
}

fn business_size(reviews: u32, config: &ScoringConfig) -> BusinessSize {
    if reviews < config.medium_business_reviews {
        BusinessSize::Small
    } else if reviews < config.large_business_reviews {
        BusinessSize::Medium
    } else {
        BusinessSize::Large
    }
}
