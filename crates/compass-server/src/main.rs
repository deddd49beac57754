mod api;
mod middleware;
mod scheduler;

use std::{net::SocketAddr, sync::Arc};

use compass_directory::DirectoryClient;
use compass_engine::{subscription, EngineSettings, SearchEngine};
use compass_probe::WebsiteProbe;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
    scheduler::SweepTargets,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(compass_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let scoring = compass_core::load_scoring_config(config.scoring_path.as_deref())?;
    let settings = EngineSettings::from_app_config(&config, &scoring);
    let engine = SearchEngine::new(
        DirectoryClient::from_config(&config)?,
        WebsiteProbe::from_config(&config)?,
        scoring,
        settings,
    )
    .with_subscriptions(subscription::from_app_config(&config));
    let engine = Arc::new(engine);

    let check_limit = RateLimitState::from_app_config(&config);
    let _scheduler = scheduler::build_scheduler(
        SweepTargets {
            quota: engine.quota(),
            cache: engine.cache(),
            check_limit: check_limit.clone(),
        },
        &config.sweep_cron,
    )
    .await?;

    let app = build_app(AppState { engine }, check_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "compass-server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
