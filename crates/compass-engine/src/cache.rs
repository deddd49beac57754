//! Short-lived deduplication of identical searches.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use compass_core::ScoredBusiness;
use tokio::sync::Mutex;

/// Post-filter scored result set, shared between the cache and responses.
pub type CachedResults = Arc<Vec<ScoredBusiness>>;

#[derive(Debug)]
struct CacheEntry {
    payload: CachedResults,
    created_at: Instant,
}

/// Keyed result cache with an age check on every read.
///
/// Expired entries are never served; [`ResultCache::sweep`] only bounds
/// memory.
#[derive(Debug)]
pub struct ResultCache {
    freshness: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    #[must_use]
    pub fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lookup(&self, key: &str, now: Instant) -> Option<CachedResults> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.created_at) < self.freshness {
            Some(Arc::clone(&entry.payload))
        } else {
            None
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    pub async fn store(&self, key: String, payload: CachedResults, now: Instant) {
        self.entries.lock().await.insert(
            key,
            CacheEntry {
                payload,
                created_at: now,
            },
        );
    }

    /// Drops entries at or past the freshness window. Returns how many went.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.created_at) < self.freshness);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
