//! Builders shared by the scoring and market tests.

use compass_core::{Candidate, ProbeResult, ProbeStatus};

pub fn candidate(name: &str) -> Candidate {
    Candidate {
        id: format!("gmaps:{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        address: "Austin, TX".to_string(),
        location: None,
        categories: vec![],
        rating: None,
        rating_count: None,
        price_level: None,
        phone: None,
        website: None,
        hours: vec![],
        emails: vec![],
        social_profiles: compass_core::SocialProfiles::default(),
    }
}

pub fn with_site(mut candidate: Candidate) -> Candidate {
    candidate.website = Some(format!("https://{}.example", candidate.name.len()));
    candidate
}

pub fn with_contacts(mut candidate: Candidate) -> Candidate {
    candidate.emails = vec![format!("hello@{}.example", candidate.name.len())];
    candidate.social_profiles.facebook =
        vec![format!("https://facebook.example/{}", candidate.name.len())];
    candidate
}

pub fn rated(mut candidate: Candidate, rating: f64, count: u32) -> Candidate {
    candidate.rating = Some(rating);
    candidate.rating_count = Some(count);
    candidate
}

pub fn accessible(tls: bool, latency_ms: u64) -> ProbeResult {
    let mut result = ProbeResult::failed(ProbeStatus::Accessible, None, String::new());
    result.reachable = true;
    result.status_code = Some(200);
    result.tls = tls;
    result.latency_ms = Some(latency_ms);
    result.error = None;
    result
}

pub fn broken(status: ProbeStatus) -> ProbeResult {
    ProbeResult::failed(status, None, "probe failed")
}
