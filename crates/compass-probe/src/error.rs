use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The underlying `reqwest::Client` could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid website URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
