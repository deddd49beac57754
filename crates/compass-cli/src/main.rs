mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "compass-cli")]
#[command(about = "Discover local businesses and score their digital presence")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one business search and print the response envelope
    Search {
        /// Business category or free-text query (e.g., "dentists")
        #[arg(long)]
        query: String,
        /// Location to search around (e.g., "Austin, TX")
        #[arg(long)]
        location: String,
        /// Search radius in meters
        #[arg(long)]
        radius: Option<u32>,
        /// Maximum number of businesses to fetch
        #[arg(long)]
        max_results: Option<u32>,
        /// Search as this user; subscription decides the tier
        #[arg(long)]
        user_id: Option<String>,
        /// Keep only businesses without a website
        #[arg(long)]
        no_website: bool,
        /// Minimum star rating
        #[arg(long)]
        min_rating: Option<f64>,
        /// Minimum lead score
        #[arg(long)]
        min_lead_score: Option<u8>,
    },
    /// Probe a single website and print the result
    Check {
        /// Website URL; https is assumed when no scheme is given
        #[arg(long)]
        url: String,
        /// Whole-probe timeout in seconds
        #[arg(long, env = "COMPASS_PROBE_TIMEOUT_SECS", default_value = "10")]
        timeout_secs: u64,
        #[arg(
            long,
            env = "COMPASS_USER_AGENT",
            default_value = "client-compass/0.1 (business-discovery)"
        )]
        user_agent: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let fallback_level = std::env::var("COMPASS_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            query,
            location,
            radius,
            max_results,
            user_id,
            no_website,
            min_rating,
            min_lead_score,
        } => {
            let request = compass_engine::SearchRequest {
                query,
                location,
                radius_meters: radius,
                max_results,
                user_id,
                filter_no_website: no_website,
                min_rating,
                min_lead_score,
            };
            commands::run_search(&request).await
        }
        Commands::Check {
            url,
            timeout_secs,
            user_agent,
        } => commands::run_check(&url, timeout_secs, &user_agent).await,
    }
}
