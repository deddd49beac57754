use std::time::Duration;

use compass_directory::DirectoryError;
use thiserror::Error;

/// Request-level failures of a search.
///
/// Website probe failures never appear here; they are classifications on
/// the individual results.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or malformed input. No upstream call was made.
    #[error("{0}")]
    Validation(String),

    /// Requests arrived faster than the minimum spacing allows.
    #[error("please wait {retry_after_secs} seconds before searching again")]
    RateLimited { retry_after_secs: u64 },

    /// The client used every free search in the current window.
    #[error("free search limit reached; upgrade for unlimited searches")]
    QuotaExceeded,

    /// The directory provider call failed. Not retried.
    #[error("directory search failed: {0}")]
    Provider(#[from] DirectoryError),
}

impl SearchError {
    /// A rate-limit error whose hint rounds `retry_after` up to whole seconds.
    #[must_use]
    pub fn rate_limited(retry_after: Duration) -> Self {
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        Self::RateLimited {
            retry_after_secs: secs.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_hint_rounds_up() {
        let err = SearchError::rate_limited(Duration::from_millis(1_200));
        assert!(matches!(err, SearchError::RateLimited { retry_after_secs: 2 }));

        let err = SearchError::rate_limited(Duration::from_millis(1));
        assert!(matches!(err, SearchError::RateLimited { retry_after_secs: 1 }));

        let err = SearchError::rate_limited(Duration::from_secs(2));
        assert!(matches!(err, SearchError::RateLimited { retry_after_secs: 2 }));
    }
}
