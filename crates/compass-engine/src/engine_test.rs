use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use compass_core::{Candidate, ProbeResult, ProbeStatus, ScoringConfig};
use compass_directory::{Directory, DirectoryError, DirectoryQuery};
use compass_probe::SiteProber;

use super::*;
use crate::search_log::SearchLogError;
use crate::subscription::StaticSubscriptions;

#[derive(Clone, Default)]
struct FakeDirectory {
    candidates: Vec<Candidate>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    last_query: Arc<Mutex<Option<DirectoryQuery>>>,
}

impl Directory for FakeDirectory {
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<Candidate>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(DirectoryError::UnexpectedStatus {
                status: 503,
                context: "place search".to_string(),
            });
        }
        let mut out = self.candidates.clone();
        out.truncate(query.max_results as usize);
        Ok(out)
    }
}

#[derive(Clone, Default)]
struct FakeProber {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl SiteProber for FakeProber {
    async fn probe(&self, website: &str) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut result =
            ProbeResult::failed(ProbeStatus::Accessible, Some(website.to_string()), "");
        result.reachable = true;
        result.status_code = Some(200);
        result.tls = true;
        result.latency_ms = Some(120);
        result.error = None;
        result
    }
}

#[derive(Default)]
struct RecordingLog {
    entries: Arc<Mutex<Vec<SearchLogEntry>>>,
}

impl SearchLog for RecordingLog {
    fn record(&self, entry: &SearchLogEntry) -> Result<(), SearchLogError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

struct FailingLog;

impl SearchLog for FailingLog {
    fn record(&self, _entry: &SearchLogEntry) -> Result<(), SearchLogError> {
        Err(SearchLogError("disk full".to_string()))
    }
}

fn dentist(i: usize, website: bool) -> Candidate {
    Candidate {
        id: format!("gmaps:{i}"),
        name: format!("Dental Office {i:02}"),
        address: format!("{i} Congress Ave, Austin, TX"),
        location: None,
        categories: vec!["Dentist".to_string()],
        rating: Some(4.0 + (i % 10) as f64 / 10.0),
        rating_count: Some(10 * i as u32),
        price_level: None,
        phone: Some("(512) 555-0100".to_string()),
        website: website.then(|| format!("https://dental{i}.example")),
        hours: vec![],
        emails: vec![],
        social_profiles: compass_core::SocialProfiles::default(),
    }
}

/// `n` candidates; every even-indexed one has a website.
fn directory(n: usize) -> FakeDirectory {
    FakeDirectory {
        candidates: (0..n).map(|i| dentist(i, i % 2 == 0)).collect(),
        ..FakeDirectory::default()
    }
}

fn settings(daily_cap: u32, min_interval: Duration) -> EngineSettings {
    EngineSettings {
        limits: RequestLimits::default(),
        tier: TierPolicy::default(),
        quota: QuotaSettings {
            daily_cap,
            min_interval,
            window: Duration::from_secs(86_400),
            grace: Duration::from_secs(3_600),
        },
        cache_freshness: Duration::from_secs(600),
        probe_concurrency: 8,
    }
}

fn engine(dir: FakeDirectory, prober: FakeProber) -> SearchEngine<FakeDirectory, FakeProber> {
    SearchEngine::new(
        dir,
        prober,
        ScoringConfig::default(),
        settings(100, Duration::ZERO),
    )
}

fn request(query: &str, location: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        location: location.to_string(),
        ..SearchRequest::default()
    }
}

#[tokio::test]
async fn identical_search_within_freshness_is_served_from_cache() {
    let dir = directory(6);
    let prober = FakeProber::default();
    let engine = engine(dir.clone(), prober.clone());
    let t0 = Instant::now();

    let first = engine
        .search_at(&request("dentists", "Austin, TX"), "1.1.1.1", t0)
        .await
        .unwrap();
    let second = engine
        .search_at(
            &request("dentists", "Austin, TX"),
            "2.2.2.2",
            t0 + Duration::from_secs(60),
        )
        .await
        .unwrap();

    assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
    assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
    assert_eq!(first.businesses, second.businesses);
}

#[tokio::test]
async fn case_and_whitespace_variants_share_a_cache_entry() {
    let dir = directory(4);
    let engine = engine(dir.clone(), FakeProber::default());
    let t0 = Instant::now();

    engine
        .search_at(&request("Dentists", "Austin,  TX"), "a", t0)
        .await
        .unwrap();
    engine
        .search_at(&request(" dentists ", "austin, tx"), "b", t0)
        .await
        .unwrap();

    assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_cache_entry_is_recomputed() {
    let dir = directory(4);
    let engine = engine(dir.clone(), FakeProber::default());
    let t0 = Instant::now();

    engine
        .search_at(&request("dentists", "Austin"), "a", t0)
        .await
        .unwrap();
    engine
        .search_at(
            &request("dentists", "Austin"),
            "a",
            t0 + Duration::from_secs(601),
        )
        .await
        .unwrap();

    assert_eq!(dir.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cache_freshness_starts_when_probing_finishes() {
    let dir = directory(4);
    let prober = FakeProber {
        delay: Duration::from_millis(300),
        ..FakeProber::default()
    };
    let mut short_lived = settings(100, Duration::ZERO);
    short_lived.cache_freshness = Duration::from_millis(500);
    let engine = SearchEngine::new(dir.clone(), prober, ScoringConfig::default(), short_lived);
    let t0 = Instant::now();

    engine
        .search_at(&request("dentists", "Austin"), "a", t0)
        .await
        .unwrap();
    // 700ms after the request started, but under 500ms after the results existed.
    engine
        .search_at(
            &request("dentists", "Austin"),
            "a",
            t0 + Duration::from_millis(700),
        )
        .await
        .unwrap();

    assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn candidates_without_website_are_never_probed() {
    let dir = FakeDirectory {
        candidates: (0..4).map(|i| dentist(i, false)).collect(),
        ..FakeDirectory::default()
    };
    let prober = FakeProber::default();
    let engine = engine(dir, prober.clone());

    let response = engine
        .search(&request("dentists", "Austin"), "a")
        .await
        .unwrap();

    assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    assert!(response
        .businesses
        .iter()
        .all(|b| b.website_status.status == ProbeStatus::NoWebsite));
}

#[tokio::test]
async fn free_caller_sees_five_of_twelve_without_market() {
    let dir = directory(12);
    let engine = SearchEngine::new(
        dir,
        FakeProber::default(),
        ScoringConfig::default(),
        settings(3, Duration::ZERO),
    );
    let mut req = request("dentists", "Austin");
    req.max_results = Some(12);

    let response = engine.search(&req, "9.9.9.9").await.unwrap();

    assert_eq!(response.businesses.len(), 5);
    assert_eq!(response.payment_info.total_found, 12);
    assert_eq!(response.payment_info.remaining, 7);
    assert_eq!(response.payment_info.searches_remaining, Some(2));
    assert!(response.payment_info.is_free_user);
    assert!(response.statistics.market_analysis.is_none());
}

#[tokio::test]
async fn subscribed_caller_gets_market_analysis_and_no_quota() {
    let engine = engine(directory(12), FakeProber::default());
    let mut req = request("dentists", "Austin");
    req.max_results = Some(12);
    req.user_id = Some("user-1".to_string());

    let response = engine.search(&req, "9.9.9.9").await.unwrap();

    assert_eq!(response.businesses.len(), 12);
    assert!(!response.payment_info.is_free_user);
    assert_eq!(response.payment_info.remaining, 0);
    assert!(response.payment_info.searches_remaining.is_none());
    let market = response.statistics.market_analysis.expect("market analysis");
    assert!((market.website_adoption_rate - 50.0).abs() < f64::EPSILON);
    assert_eq!(engine.quota().tracked_clients().await, 0);
}

#[tokio::test]
async fn cached_results_are_reassembled_for_each_caller() {
    let dir = directory(8);
    let engine = engine(dir.clone(), FakeProber::default())
        .with_subscriptions(Box::new(StaticSubscriptions::new(["paid"])));
    let t0 = Instant::now();

    let mut paid = request("dentists", "Austin");
    paid.user_id = Some("paid".to_string());
    let paid_response = engine.search_at(&paid, "p", t0).await.unwrap();

    let mut unknown = request("dentists", "Austin");
    unknown.user_id = Some("stranger".to_string());
    let free_response = engine.search_at(&unknown, "f", t0).await.unwrap();

    assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
    assert!(paid_response.statistics.market_analysis.is_some());
    assert_eq!(paid_response.businesses.len(), 8);
    assert!(free_response.statistics.market_analysis.is_none());
    assert_eq!(free_response.businesses.len(), 5);
    assert_eq!(free_response.payment_info.remaining, 3);
}

#[tokio::test]
async fn third_spaced_search_is_rejected_at_cap_two() {
    let dir = directory(2);
    let engine = SearchEngine::new(
        dir.clone(),
        FakeProber::default(),
        ScoringConfig::default(),
        settings(2, Duration::from_secs(2)),
    );
    let t0 = Instant::now();
    let req = request("dentists", "Austin");

    engine.search_at(&req, "c", t0).await.unwrap();
    engine
        .search_at(&req, "c", t0 + Duration::from_secs(3))
        .await
        .unwrap();
    let err = engine
        .search_at(&req, "c", t0 + Duration::from_secs(6))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::QuotaExceeded));
    assert_eq!(dir.calls.load(Ordering::SeqCst), 1, "second was a cache hit");
}

#[tokio::test]
async fn rapid_resubmission_is_rate_limited() {
    let engine = SearchEngine::new(
        directory(2),
        FakeProber::default(),
        ScoringConfig::default(),
        settings(10, Duration::from_secs(2)),
    );
    let t0 = Instant::now();
    let req = request("dentists", "Austin");

    engine.search_at(&req, "c", t0).await.unwrap();
    let err = engine
        .search_at(&req, "c", t0 + Duration::from_millis(700))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::RateLimited {
            retry_after_secs: 2
        }
    ));
}

#[tokio::test]
async fn invalid_request_makes_no_upstream_call_and_costs_no_quota() {
    let dir = directory(2);
    let engine = engine(dir.clone(), FakeProber::default());

    let err = engine
        .search(&request("", "Austin"), "c")
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Validation(_)));
    assert_eq!(dir.calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.quota().tracked_clients().await, 0);
}

#[tokio::test]
async fn provider_failure_is_reported_and_not_cached() {
    let dir = directory(3);
    dir.fail.store(true, Ordering::SeqCst);
    let engine = engine(dir.clone(), FakeProber::default());
    let t0 = Instant::now();
    let req = request("dentists", "Austin");

    let err = engine.search_at(&req, "c", t0).await.unwrap_err();
    assert!(matches!(err, SearchError::Provider(_)));
    assert!(engine.cache().is_empty().await);

    dir.fail.store(false, Ordering::SeqCst);
    let response = engine.search_at(&req, "c", t0).await.unwrap();
    assert_eq!(response.payment_info.total_found, 3);
    assert_eq!(dir.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn no_website_filter_applies_before_tiering() {
    let engine = engine(directory(12), FakeProber::default());
    let mut req = request("dentists", "Austin");
    req.max_results = Some(12);
    req.filter_no_website = true;

    let response = engine.search(&req, "c").await.unwrap();

    assert_eq!(response.payment_info.total_found, 6);
    assert_eq!(response.payment_info.showing, 5);
    assert_eq!(response.payment_info.remaining, 1);
    assert!(response
        .businesses
        .iter()
        .all(|b| !b.candidate.has_website()));
    assert_eq!(response.statistics.no_website_count, 6);
}

#[tokio::test]
async fn min_lead_score_filter_drops_strong_businesses() {
    let engine = engine(directory(6), FakeProber::default());
    let mut req = request("dentists", "Austin");
    req.min_lead_score = Some(50);

    let response = engine.search(&req, "c").await.unwrap();

    assert!(response.businesses.iter().all(|b| b.lead_score >= 50));
    assert_eq!(response.payment_info.total_found, 3);
}

#[tokio::test]
async fn directory_receives_normalized_query() {
    let dir = directory(1);
    let engine = engine(dir.clone(), FakeProber::default());
    let mut req = request("  family   dentists ", "Austin, TX");
    req.radius_meters = Some(5_000);
    req.max_results = Some(99);

    engine.search(&req, "c").await.unwrap();

    let seen = dir.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(seen.query, "family dentists");
    assert_eq!(seen.radius_m, 5_000);
    assert_eq!(seen.max_results, 20);
}

#[tokio::test]
async fn search_log_sees_cache_hits() {
    let log = RecordingLog::default();
    let entries = Arc::clone(&log.entries);
    let engine = engine(directory(2), FakeProber::default()).with_search_log(Box::new(log));
    let t0 = Instant::now();
    let req = request("dentists", "Austin");

    engine.search_at(&req, "a", t0).await.unwrap();
    engine.search_at(&req, "b", t0).await.unwrap();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].cache_hit);
    assert!(entries[1].cache_hit);
    assert_eq!(entries[1].client_id, "b");
    assert_eq!(entries[1].result_count, 2);
}

#[tokio::test]
async fn search_log_failure_does_not_fail_the_search() {
    let engine =
        engine(directory(2), FakeProber::default()).with_search_log(Box::new(FailingLog));

    let response = engine.search(&request("dentists", "Austin"), "c").await;

    assert!(response.is_ok());
}

#[tokio::test]
async fn dentists_in_austin_end_to_end_for_anonymous_caller() {
    let engine = SearchEngine::new(
        directory(10),
        FakeProber::default(),
        ScoringConfig::default(),
        settings(3, Duration::from_secs(2)),
    );
    let req: SearchRequest = serde_json::from_str(
        r#"{"query":"dentists","location":"Austin, TX","radius":15000,"maxResults":10}"#,
    )
    .unwrap();

    let response = engine.search(&req, "203.0.113.7").await.unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["payment_info"]["is_free_user"], true);
    assert!(json["payment_info"]["showing"].as_u64().unwrap() <= 5);
    assert!(json["statistics"].get("market_analysis").is_none());
    for business in json["businesses"].as_array().unwrap() {
        assert!(business["business_insights"]["digital_presence"].is_string());
        let score = business["lead_score"].as_u64().unwrap();
        assert!(score <= 100);
    }
}
