//! Per-business opportunity scoring and market-level aggregation.
//!
//! Everything here is a pure function of its inputs and a [`ScoringConfig`].

pub mod market;
pub mod score;
pub mod services;

pub use market::aggregate;
pub use score::{score, score_all};

#[cfg(test)]
pub(crate) mod fixtures;

/// Rounds to one decimal place.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
