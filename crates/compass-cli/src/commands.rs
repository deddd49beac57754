//! Command handlers. Output goes to stdout as pretty JSON; logs go to stderr.

use compass_directory::DirectoryClient;
use compass_engine::{subscription, EngineSettings, SearchEngine, SearchRequest};
use compass_probe::{SiteProber, WebsiteProbe};

/// Client id the quota gate sees for CLI searches.
const CLI_CLIENT_ID: &str = "cli";

/// Runs one search with the same pipeline the server uses.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, a client cannot
/// be built, or the search itself fails.
pub(crate) async fn run_search(request: &SearchRequest) -> anyhow::Result<()> {
    let config = compass_core::load_app_config()?;
    let scoring = compass_core::load_scoring_config(config.scoring_path.as_deref())?;
    let settings = EngineSettings::from_app_config(&config, &scoring);

    let engine = SearchEngine::new(
        DirectoryClient::from_config(&config)?,
        WebsiteProbe::from_config(&config)?,
        scoring,
        settings,
    )
    .with_subscriptions(subscription::from_app_config(&config));

    tracing::info!(query = %request.query, location = %request.location, "running search");
    let response = engine.search(request, CLI_CLIENT_ID).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Probes one website. Needs no directory credentials.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the result cannot
/// be serialized. Probe failures are part of the printed result.
pub(crate) async fn run_check(url: &str, timeout_secs: u64, user_agent: &str) -> anyhow::Result<()> {
    let prober = WebsiteProbe::new(timeout_secs, user_agent)?;
    let result = prober.probe(url).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
