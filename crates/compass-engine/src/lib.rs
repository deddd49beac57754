//! Business discovery search engine.
//!
//! [`SearchEngine`] ties the pieces together: a [`QuotaGate`] in front, a
//! [`ResultCache`] deduplicating identical searches, the directory and
//! website probes for fresh data, scoring, and tiered response assembly.

pub mod assembler;
pub mod cache;
pub mod engine;
pub mod error;
pub mod quota;
pub mod request;
pub mod search_log;
pub mod subscription;

pub use assembler::{PaymentInfo, SearchResponse, SearchStatistics, TierPolicy};
pub use cache::ResultCache;
pub use engine::{EngineSettings, SearchEngine};
pub use error::SearchError;
pub use quota::{QuotaDecision, QuotaGate, QuotaSettings};
pub use request::{RequestLimits, SearchFilters, SearchRequest};
pub use search_log::{SearchLog, SearchLogEntry, SearchLogError, TracingSearchLog};
pub use subscription::{AnyUserIsSubscribed, StaticSubscriptions, SubscriptionLookup};
