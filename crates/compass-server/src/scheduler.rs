//! Background job scheduler.
//!
//! Runs the periodic sweep that bounds the memory held by the quota gate,
//! the result cache and the check-website limiter. Expiry correctness does
//! not depend on it; every read checks age itself.

use std::sync::Arc;
use std::time::Instant;

use compass_engine::{QuotaGate, ResultCache};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::middleware::RateLimitState;

/// Shared tables the sweep job evicts from.
#[derive(Clone)]
pub struct SweepTargets {
    pub quota: Arc<QuotaGate>,
    pub cache: Arc<ResultCache>,
    pub check_limit: RateLimitState,
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the sweep job cannot be registered (including a malformed `cron`), or
/// the scheduler fails to start.
pub async fn build_scheduler(
    targets: SweepTargets,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sweep_job(&scheduler, targets, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_sweep_job(
    scheduler: &JobScheduler,
    targets: SweepTargets,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let targets = Arc::new(targets);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let targets = Arc::clone(&targets);

        Box::pin(async move {
            tracing::info!("scheduler: starting sweep");
            run_sweep(&targets, Instant::now()).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: sweep job registered");
    Ok(())
}

/// Evicts stale entries from every table. Returns the total removed.
async fn run_sweep(targets: &SweepTargets, now: Instant) -> usize {
    let quota_evicted = targets.quota.sweep(now).await;
    let cache_evicted = targets.cache.sweep(now).await;
    let limiter_evicted = targets.check_limit.sweep(now).await;

    tracing::info!(
        quota_evicted,
        cache_evicted,
        limiter_evicted,
        "scheduler: sweep complete"
    );
    quota_evicted + cache_evicted + limiter_evicted
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use compass_engine::QuotaSettings;

    use super::*;

    #[tokio::test]
    async fn sweep_clears_every_table() {
        let targets = SweepTargets {
            quota: Arc::new(QuotaGate::new(QuotaSettings {
                daily_cap: 3,
                min_interval: Duration::ZERO,
                window: Duration::from_secs(60),
                grace: Duration::from_secs(10),
            })),
            cache: Arc::new(ResultCache::new(Duration::from_secs(30))),
            check_limit: RateLimitState::new(5, Duration::from_secs(60)),
        };
        let t0 = Instant::now();
        targets.quota.check("c", false, t0).await;
        targets
            .cache
            .store("k".to_string(), Arc::new(Vec::new()), t0)
            .await;

        assert_eq!(run_sweep(&targets, t0 + Duration::from_secs(5)).await, 0);
        assert_eq!(run_sweep(&targets, t0 + Duration::from_secs(71)).await, 2);
        assert_eq!(targets.quota.tracked_clients().await, 0);
        assert!(targets.cache.is_empty().await);
    }
}
