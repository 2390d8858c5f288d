use std::net::SocketAddr;

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

/// Connection details for the durable REST key/value store.
///
/// Present only when both the URL and the token are configured; otherwise
/// the in-memory cache backend is used.
#[derive(Clone, PartialEq, Eq)]
pub struct DurableCacheConfig {
    pub url: String,
    pub token: String,
}

/// A bearer-token authenticated data provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub api_key: String,
}

/// Chat-completions endpoint used for narrative metrics.
#[derive(Clone, PartialEq, Eq)]
pub struct NarrativeEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub durable_cache: Option<DurableCacheConfig>,
    pub cache_ttl_secs: u64,
    /// Six-field cron expression for the in-memory cache sweep.
    pub cache_sweep_cron: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_jitter: bool,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub search_interest: Option<ProviderEndpoint>,
    pub keyword_metrics: Option<ProviderEndpoint>,
    pub competitors: Option<ProviderEndpoint>,
    pub audience: Option<ProviderEndpoint>,
    pub narrative: Option<NarrativeEndpoint>,
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for DurableCacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableCacheConfig")
            .field("url", &self.url)
            .field("token", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for NarrativeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("durable_cache", &self.durable_cache)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_sweep_cron", &self.cache_sweep_cron)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_jitter", &self.retry_jitter)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("search_interest", &self.search_interest)
            .field("keyword_metrics", &self.keyword_metrics)
            .field("competitors", &self.competitors)
            .field("audience", &self.audience)
            .field("narrative", &self.narrative)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
