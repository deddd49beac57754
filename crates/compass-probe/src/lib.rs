//! Website liveness and quality probing.
//!
//! [`probe_all`] fans a search's candidates out over a [`SiteProber`] with
//! bounded concurrency and returns one [`ProbeResult`] per candidate, in
//! candidate order. Candidates without a website never touch the network.

pub mod classify;
pub mod error;
pub mod prober;
pub mod url;

use std::future::Future;

use compass_core::{Candidate, ProbeResult};
use futures::stream::{self, StreamExt};

pub use error::ProbeError;
pub use prober::WebsiteProbe;
pub use url::normalize_url;

/// Checks a single website. Implementations convert every failure into a
/// [`ProbeResult`] classification instead of returning an error.
pub trait SiteProber: Send + Sync {
    fn probe(&self, website: &str) -> impl Future<Output = ProbeResult> + Send;
}

/// Probes every candidate concurrently, at most `max_concurrent` at a time.
///
/// The output is aligned 1:1 with `candidates`.
pub async fn probe_all<P: SiteProber>(
    prober: &P,
    candidates: &[Candidate],
    max_concurrent: usize,
) -> Vec<ProbeResult> {
    let probes: Vec<_> = candidates
        .iter()
        .map(|candidate| async move {
            match candidate.website.as_deref() {
                Some(website) => prober.probe(website).await,
                None => ProbeResult::no_website(),
            }
        })
        .collect();
    stream::iter(probes)
    .buffered(max_concurrent.max(1))
    .collect()
    .await
}
