//! Search orchestration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use compass_core::{AppConfig, ScoredBusiness, ScoringConfig};
use compass_directory::Directory;
use compass_probe::{probe_all, SiteProber};
use compass_scoring::{aggregate, score_all};

use crate::assembler::{assemble, Access, SearchResponse, TierPolicy};
use crate::cache::ResultCache;
use crate::error::SearchError;
use crate::quota::{QuotaDecision, QuotaGate, QuotaSettings};
use crate::request::{NormalizedSearch, RequestLimits, SearchRequest};
use crate::search_log::{SearchLog, SearchLogEntry, TracingSearchLog};
use crate::subscription::{AnyUserIsSubscribed, SubscriptionLookup};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub limits: RequestLimits,
    pub tier: TierPolicy,
    pub quota: QuotaSettings,
    pub cache_freshness: Duration,
    pub probe_concurrency: usize,
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, scoring: &ScoringConfig) -> Self {
        Self {
            limits: RequestLimits::from_app_config(config),
            tier: TierPolicy::from_config(config, scoring),
            quota: QuotaSettings::from_app_config(config),
            cache_freshness: Duration::from_secs(config.cache_freshness_secs),
            probe_concurrency: config.probe_max_concurrent,
        }
    }
}

/// Runs searches end to end: quota, cache, directory, probes, scoring,
/// market analysis and tiering.
///
/// The quota gate and result cache are shared through `Arc` so the sweep
/// scheduler can reach them.
pub struct SearchEngine<D, P> {
    directory: D,
    prober: P,
    quota: Arc<QuotaGate>,
    cache: Arc<ResultCache>,
    subscriptions: Box<dyn SubscriptionLookup>,
    search_log: Box<dyn SearchLog>,
    scoring: ScoringConfig,
    settings: EngineSettings,
}

impl<D: Directory, P: SiteProber> SearchEngine<D, P> {
    pub fn new(directory: D, prober: P, scoring: ScoringConfig, settings: EngineSettings) -> Self {
        Self {
            directory,
            prober,
            quota: Arc::new(QuotaGate::new(settings.quota)),
            cache: Arc::new(ResultCache::new(settings.cache_freshness)),
            subscriptions: Box::new(AnyUserIsSubscribed),
            search_log: Box::new(TracingSearchLog),
            scoring,
            settings,
        }
    }

    #[must_use]
    pub fn with_subscriptions(mut self, subscriptions: Box<dyn SubscriptionLookup>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    #[must_use]
    pub fn with_search_log(mut self, search_log: Box<dyn SearchLog>) -> Self {
        self.search_log = search_log;
        self
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn quota(&self) -> Arc<QuotaGate> {
        Arc::clone(&self.quota)
    }

    pub fn cache(&self) -> Arc<ResultCache> {
        Arc::clone(&self.cache)
    }

    /// # Errors
    ///
    /// See [`SearchEngine::search_at`].
    pub async fn search(
        &self,
        request: &SearchRequest,
        client_id: &str,
    ) -> Result<SearchResponse, SearchError> {
        self.search_at(request, client_id, Instant::now()).await
    }

    /// Runs one search as of `now`.
    ///
    /// The request is counted against the client's quota once, before the
    /// cache is consulted, so a cache hit costs the same as a fresh search.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Validation`] for bad input, before any upstream call.
    /// - [`SearchError::RateLimited`] or [`SearchError::QuotaExceeded`] from
    ///   the quota gate.
    /// - [`SearchError::Provider`] when the directory call fails. Nothing is
    ///   cached in that case.
    pub async fn search_at(
        &self,
        request: &SearchRequest,
        client_id: &str,
        now: Instant,
    ) -> Result<SearchResponse, SearchError> {
        let search = request.normalize(&self.settings.limits)?;
        let subscribed = self.subscriptions.is_subscribed(search.user_id.as_deref());

        let searches_remaining = match self.quota.check(client_id, subscribed, now).await {
            QuotaDecision::Allow { searches_remaining } => searches_remaining,
            QuotaDecision::Deny { retry_after } => {
                tracing::debug!(client_id, ?retry_after, "search denied: too frequent");
                return Err(SearchError::rate_limited(retry_after));
            }
            QuotaDecision::Reject => {
                tracing::info!(client_id, "search rejected: quota exhausted");
                return Err(SearchError::QuotaExceeded);
            }
        };

        let key = search.cache_key();
        let (scored, cache_hit) = if let Some(hit) = self.cache.lookup(&key, now).await {
            (hit, true)
        } else {
            let started = Instant::now();
            let fresh = Arc::new(self.run_pipeline(&search).await?);
            // Freshness runs from when the results were produced.
            let produced_at = now.checked_add(started.elapsed()).unwrap_or(now);
            self.cache.store(key, Arc::clone(&fresh), produced_at).await;
            (fresh, false)
        };

        let market = subscribed.then(|| aggregate(&scored, &self.scoring));
        let response = assemble(
            &scored,
            market,
            Access {
                subscribed,
                searches_remaining,
            },
            &self.settings.tier,
        );

        let entry = SearchLogEntry {
            query: search.query,
            location: search.location,
            client_id: client_id.to_string(),
            user_id: search.user_id,
            result_count: scored.len(),
            subscribed,
            cache_hit,
            at: Utc::now(),
        };
        if let Err(e) = self.search_log.record(&entry) {
            tracing::warn!(error = %e, client_id, "failed to record search");
        }

        Ok(response)
    }

    async fn run_pipeline(
        &self,
        search: &NormalizedSearch,
    ) -> Result<Vec<ScoredBusiness>, SearchError> {
        let candidates = self
            .directory
            .search(&search.directory_query())
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    query = %search.query,
                    location = %search.location,
                    "directory search failed"
                );
                SearchError::from(e)
            })?;

        let probes = probe_all(&self.prober, &candidates, self.settings.probe_concurrency).await;
        let scored = score_all(candidates, probes, &self.scoring);
        let filtered = search.filters.apply(scored);

        tracing::info!(
            query = %search.query,
            location = %search.location,
            count = filtered.len(),
            "search pipeline complete"
        );
        Ok(filtered)
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
