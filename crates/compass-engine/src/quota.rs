//! Per-client search quota for unsubscribed callers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use compass_core::AppConfig;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSettings {
    pub daily_cap: u32,
    pub min_interval: Duration,
    pub window: Duration,
    /// Extra time a record is kept after its window before a sweep evicts it.
    pub grace: Duration,
}

impl QuotaSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            daily_cap: config.quota_daily_cap,
            min_interval: Duration::from_millis(config.quota_min_interval_ms),
            window: Duration::from_secs(config.quota_window_secs),
            grace: Duration::from_secs(config.quota_grace_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow {
        /// Searches left in the window; `None` for subscribed callers.
        searches_remaining: Option<u32>,
    },
    /// Too soon after the previous accepted request.
    Deny { retry_after: Duration },
    /// Window cap reached.
    Reject,
}

#[derive(Debug, Clone)]
struct QuotaRecord {
    count: u32,
    window_start: Instant,
    last_request: Instant,
}

/// Tracks usage per client id. Subscribed callers are never tracked.
#[derive(Debug)]
pub struct QuotaGate {
    settings: QuotaSettings,
    records: Mutex<HashMap<String, QuotaRecord>>,
}

impl QuotaGate {
    #[must_use]
    pub fn new(settings: QuotaSettings) -> Self {
        Self {
            settings,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Admits or refuses one request, counting it when admitted.
    ///
    /// The minimum-spacing check runs before the cap check, so a burst is
    /// told to wait even when searches remain.
    pub async fn check(&self, client_id: &str, subscribed: bool, now: Instant) -> QuotaDecision {
        if subscribed {
            return QuotaDecision::Allow {
                searches_remaining: None,
            };
        }

        let cap = self.settings.daily_cap;
        if cap == 0 {
            return QuotaDecision::Reject;
        }

        let mut records = self.records.lock().await;
        let Some(record) = records.get_mut(client_id) else {
            records.insert(
                client_id.to_string(),
                QuotaRecord {
                    count: 1,
                    window_start: now,
                    last_request: now,
                },
            );
            return QuotaDecision::Allow {
                searches_remaining: Some(cap - 1),
            };
        };

        if now.saturating_duration_since(record.window_start) >= self.settings.window {
            *record = QuotaRecord {
                count: 1,
                window_start: now,
                last_request: now,
            };
            return QuotaDecision::Allow {
                searches_remaining: Some(cap - 1),
            };
        }

        let since_last = now.saturating_duration_since(record.last_request);
        if since_last < self.settings.min_interval {
            return QuotaDecision::Deny {
                retry_after: self.settings.min_interval - since_last,
            };
        }

        if record.count >= cap {
            return QuotaDecision::Reject;
        }

        record.count += 1;
        record.last_request = now;
        QuotaDecision::Allow {
            searches_remaining: Some(cap - record.count),
        }
    }

    /// Evicts records whose window started more than window + grace ago.
    /// Returns the number of records removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let ttl = self.settings.window + self.settings.grace;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| now.saturating_duration_since(r.window_start) <= ttl);
        before - records.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(daily_cap: u32) -> QuotaGate {
        QuotaGate::new(QuotaSettings {
            daily_cap,
            min_interval: Duration::from_secs(2),
            window: Duration::from_secs(86_400),
            grace: Duration::from_secs(3_600),
        })
    }

    #[tokio::test]
    async fn first_request_is_counted() {
        let gate = gate(3);
        let decision = gate.check("1.2.3.4", false, Instant::now()).await;
        assert_eq!(
            decision,
            QuotaDecision::Allow {
                searches_remaining: Some(2)
            }
        );
    }

    #[tokio::test]
    async fn third_spaced_request_is_rejected_at_cap_two() {
        let gate = gate(2);
        let t0 = Instant::now();
        assert!(matches!(
            gate.check("c", false, t0).await,
            QuotaDecision::Allow { .. }
        ));
        assert_eq!(
            gate.check("c", false, t0 + Duration::from_secs(3)).await,
            QuotaDecision::Allow {
                searches_remaining: Some(0)
            }
        );
        assert_eq!(
            gate.check("c", false, t0 + Duration::from_secs(6)).await,
            QuotaDecision::Reject
        );
    }

    #[tokio::test]
    async fn burst_is_denied_before_cap_is_considered() {
        let gate = gate(10);
        let t0 = Instant::now();
        gate.check("c", false, t0).await;
        let decision = gate
            .check("c", false, t0 + Duration::from_millis(500))
            .await;
        assert_eq!(
            decision,
            QuotaDecision::Deny {
                retry_after: Duration::from_millis(1_500)
            }
        );
    }

    #[tokio::test]
    async fn deny_and_reject_do_not_consume_quota() {
        let gate = gate(2);
        let t0 = Instant::now();
        gate.check("c", false, t0).await;
        gate.check("c", false, t0 + Duration::from_millis(100)).await;
        assert_eq!(
            gate.check("c", false, t0 + Duration::from_secs(3)).await,
            QuotaDecision::Allow {
                searches_remaining: Some(0)
            }
        );
    }

    #[tokio::test]
    async fn window_elapsed_resets_and_counts_the_request() {
        let gate = gate(1);
        let t0 = Instant::now();
        gate.check("c", false, t0).await;
        assert_eq!(
            gate.check("c", false, t0 + Duration::from_secs(10)).await,
            QuotaDecision::Reject
        );
        assert_eq!(
            gate.check("c", false, t0 + Duration::from_secs(86_400)).await,
            QuotaDecision::Allow {
                searches_remaining: Some(0)
            }
        );
    }

    #[tokio::test]
    async fn subscribed_clients_are_not_tracked() {
        let gate = gate(1);
        let t0 = Instant::now();
        for i in 0..5 {
            assert_eq!(
                gate.check("vip", true, t0 + Duration::from_millis(i)).await,
                QuotaDecision::Allow {
                    searches_remaining: None
                }
            );
        }
        assert_eq!(gate.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn clients_are_tracked_independently() {
        let gate = gate(1);
        let t0 = Instant::now();
        gate.check("a", false, t0).await;
        assert!(matches!(
            gate.check("b", false, t0).await,
            QuotaDecision::Allow { .. }
        ));
    }

    #[tokio::test]
    async fn sweep_evicts_only_records_past_window_and_grace() {
        let gate = gate(3);
        let t0 = Instant::now();
        gate.check("old", false, t0).await;
        gate.check("new", false, t0 + Duration::from_secs(80_000)).await;

        let removed = gate.sweep(t0 + Duration::from_secs(86_400 + 3_601)).await;

        assert_eq!(removed, 1);
        assert_eq!(gate.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn zero_cap_rejects_everyone_unsubscribed() {
        let gate = gate(0);
        assert_eq!(
            gate.check("c", false, Instant::now()).await,
            QuotaDecision::Reject
        );
    }
}
