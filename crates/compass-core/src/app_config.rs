use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub directory_api_key: String,
    pub directory_base_url: String,
    pub geocoder_base_url: String,
    pub directory_timeout_secs: u64,
    pub user_agent: String,
    pub probe_timeout_secs: u64,
    pub probe_max_concurrent: usize,
    pub quota_daily_cap: u32,
    pub quota_min_interval_ms: u64,
    pub quota_window_secs: u64,
    pub quota_grace_secs: u64,
    pub cache_freshness_secs: u64,
    pub sweep_cron: String,
    pub free_result_limit: usize,
    pub paid_result_limit: usize,
    pub max_results_cap: u32,
    pub default_radius_m: u32,
    pub default_max_results: u32,
    pub upgrade_price: f64,
    /// `None` means any caller presenting a user id is treated as subscribed.
    pub subscribed_users: Option<Vec<String>>,
    pub scoring_path: Option<PathBuf>,
    pub check_rate_limit: usize,
    pub check_rate_window_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("directory_api_key", &"[redacted]")
            .field("directory_base_url", &self.directory_base_url)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("directory_timeout_secs", &self.directory_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("probe_max_concurrent", &self.probe_max_concurrent)
            .field("quota_daily_cap", &self.quota_daily_cap)
            .field("quota_min_interval_ms", &self.quota_min_interval_ms)
            .field("quota_window_secs", &self.quota_window_secs)
            .field("quota_grace_secs", &self.quota_grace_secs)
            .field("cache_freshness_secs", &self.cache_freshness_secs)
            .field("sweep_cron", &self.sweep_cron)
            .field("free_result_limit", &self.free_result_limit)
            .field("paid_result_limit", &self.paid_result_limit)
            .field("max_results_cap", &self.max_results_cap)
            .field("default_radius_m", &self.default_radius_m)
            .field("default_max_results", &self.default_max_results)
            .field("upgrade_price", &self.upgrade_price)
            .field(
                "subscribed_users",
                &self.subscribed_users.as_ref().map(Vec::len),
            )
            .field("scoring_path", &self.scoring_path)
            .field("check_rate_limit", &self.check_rate_limit)
            .field("check_rate_window_secs", &self.check_rate_window_secs)
            .finish()
    }
}
