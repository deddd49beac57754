use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let directory_api_key = require("COMPASS_DIRECTORY_API_KEY")?;

    let env = parse_environment(&or_default("COMPASS_ENV", "development"))?;
    let bind_addr: SocketAddr = parse_var(
        "COMPASS_BIND_ADDR",
        &or_default("COMPASS_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("COMPASS_LOG_LEVEL", "info");

    let directory_base_url = or_default(
        "COMPASS_DIRECTORY_BASE_URL",
        "https://cloud.gmapsextractor.com/api/v2",
    );
    let geocoder_base_url = or_default(
        "COMPASS_GEOCODER_BASE_URL",
        "https://nominatim.openstreetmap.org",
    );
    let directory_timeout_secs: u64 = parse_var(
        "COMPASS_DIRECTORY_TIMEOUT_SECS",
        &or_default("COMPASS_DIRECTORY_TIMEOUT_SECS", "30"),
    )?;
    let user_agent = or_default(
        "COMPASS_USER_AGENT",
        "client-compass/0.1 (business-discovery)",
    );

    let probe_timeout_secs: u64 = parse_var(
        "COMPASS_PROBE_TIMEOUT_SECS",
        &or_default("COMPASS_PROBE_TIMEOUT_SECS", "10"),
    )?;
    let probe_max_concurrent: usize = parse_var(
        "COMPASS_PROBE_MAX_CONCURRENT",
        &or_default("COMPASS_PROBE_MAX_CONCURRENT", "20"),
    )?;

    let quota_daily_cap: u32 = parse_var(
        "COMPASS_QUOTA_DAILY_CAP",
        &or_default("COMPASS_QUOTA_DAILY_CAP", "3"),
    )?;
    let quota_min_interval_ms: u64 = parse_var(
        "COMPASS_QUOTA_MIN_INTERVAL_MS",
        &or_default("COMPASS_QUOTA_MIN_INTERVAL_MS", "2000"),
    )?;
    let quota_window_secs: u64 = parse_var(
        "COMPASS_QUOTA_WINDOW_SECS",
        &or_default("COMPASS_QUOTA_WINDOW_SECS", "86400"),
    )?;
    let quota_grace_secs: u64 = parse_var(
        "COMPASS_QUOTA_GRACE_SECS",
        &or_default("COMPASS_QUOTA_GRACE_SECS", "3600"),
    )?;
    let cache_freshness_secs: u64 = parse_var(
        "COMPASS_CACHE_FRESHNESS_SECS",
        &or_default("COMPASS_CACHE_FRESHNESS_SECS", "600"),
    )?;
    let sweep_cron = or_default("COMPASS_SWEEP_CRON", "0 0 * * * *");

    let free_result_limit: usize = parse_var(
        "COMPASS_FREE_RESULT_LIMIT",
        &or_default("COMPASS_FREE_RESULT_LIMIT", "5"),
    )?;
    let paid_result_limit: usize = parse_var(
        "COMPASS_PAID_RESULT_LIMIT",
        &or_default("COMPASS_PAID_RESULT_LIMIT", "20"),
    )?;
    let max_results_cap: u32 = parse_var(
        "COMPASS_MAX_RESULTS_CAP",
        &or_default("COMPASS_MAX_RESULTS_CAP", "20"),
    )?;
    let default_radius_m: u32 = parse_var(
        "COMPASS_DEFAULT_RADIUS_M",
        &or_default("COMPASS_DEFAULT_RADIUS_M", "15000"),
    )?;
    let default_max_results: u32 = parse_var(
        "COMPASS_DEFAULT_MAX_RESULTS",
        &or_default("COMPASS_DEFAULT_MAX_RESULTS", "10"),
    )?;
    let upgrade_price: f64 = parse_var(
        "COMPASS_UPGRADE_PRICE",
        &or_default("COMPASS_UPGRADE_PRICE", "20.00"),
    )?;

    let subscribed_users = lookup("COMPASS_SUBSCRIBED_USERS").ok().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>()
    });
    let scoring_path = lookup("COMPASS_SCORING_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let check_rate_limit: usize = parse_var(
        "COMPASS_CHECK_RATE_LIMIT",
        &or_default("COMPASS_CHECK_RATE_LIMIT", "10"),
    )?;
    let check_rate_window_secs: u64 = parse_var(
        "COMPASS_CHECK_RATE_WINDOW_SECS",
        &or_default("COMPASS_CHECK_RATE_WINDOW_SECS", "60"),
    )?;

    if free_result_limit == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "COMPASS_FREE_RESULT_LIMIT".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if probe_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "COMPASS_PROBE_TIMEOUT_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if !upgrade_price.is_finite() || upgrade_price < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "COMPASS_UPGRADE_PRICE".to_string(),
            reason: "must be a non-negative amount".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        directory_api_key,
        directory_base_url,
        geocoder_base_url,
        directory_timeout_secs,
        user_agent,
        probe_timeout_secs,
        probe_max_concurrent,
        quota_daily_cap,
        quota_min_interval_ms,
        quota_window_secs,
        quota_grace_secs,
        cache_freshness_secs,
        sweep_cron,
        free_result_limit,
        paid_result_limit,
        max_results_cap,
        default_radius_m,
        default_max_results,
        upgrade_price,
        subscribed_users,
        scoring_path,
        check_rate_limit,
        check_rate_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COMPASS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
