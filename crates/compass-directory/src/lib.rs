//! Place-search directory adapter.
//!
//! Resolves a category query and a free-text location into normalized
//! [`Candidate`]s. The location is geocoded first and passed to the provider
//! as a viewport; if geocoding fails the search degrades to a name-only query
//! rather than failing.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

use std::future::Future;

use compass_core::Candidate;

pub use client::DirectoryClient;
pub use error::DirectoryError;

/// Parameters for one directory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    pub query: String,
    pub location: String,
    pub radius_m: u32,
    pub max_results: u32,
}

/// A source of candidate businesses.
///
/// Implementations return at most `max_results` candidates in provider order
/// and do not retry.
pub trait Directory: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the upstream provider call fails.
    fn search(
        &self,
        query: &DirectoryQuery,
    ) -> impl Future<Output = Result<Vec<Candidate>, DirectoryError>> + Send;
}
