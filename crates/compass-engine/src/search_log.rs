use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Metadata about one answered search, handed to the logging collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchLogEntry {
    pub query: String,
    pub location: String,
    pub client_id: String,
    pub user_id: Option<String>,
    pub result_count: usize,
    pub subscribed: bool,
    pub cache_hit: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("search log write failed: {0}")]
pub struct SearchLogError(pub String);

/// Best-effort sink for search metadata. Errors are logged by the caller
/// and never reach the client.
pub trait SearchLog: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SearchLogError`] when the entry could not be recorded.
    fn record(&self, entry: &SearchLogEntry) -> Result<(), SearchLogError>;
}

/// Emits each entry as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSearchLog;

impl SearchLog for TracingSearchLog {
    fn record(&self, entry: &SearchLogEntry) -> Result<(), SearchLogError> {
        tracing::info!(
            query = %entry.query,
            location = %entry.location,
            client_id = %entry.client_id,
            user_id = entry.user_id.as_deref().unwrap_or("-"),
            count = entry.result_count,
            subscribed = entry.subscribed,
            cache_hit = entry.cache_hit,
            at = %entry.at,
            "search completed"
        );
        Ok(())
    }
}
