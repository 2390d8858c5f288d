use crate::app_config::{
    AppConfig, DurableCacheConfig, Environment, NarrativeEndpoint, ProviderEndpoint,
};
use crate::ConfigError;

const DEFAULT_NARRATIVE_URL: &str = "https://api.openai.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if paired env vars are half-set or values are invalid.
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
/// Returns `ConfigError` if paired env vars are half-set or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    // Both halves of a credential pair must be present, or neither.
    let pair = |first: &str, second: &str| -> Result<Option<(String, String)>, ConfigError> {
        match (optional(first), optional(second)) {
            (Some(a), Some(b)) => Ok(Some((a, b))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(second.to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(first.to_string())),
        }
    };

    let provider = |url_var: &str, key_var: &str| -> Result<Option<ProviderEndpoint>, ConfigError> {
        Ok(pair(url_var, key_var)?.map(|(base_url, api_key)| ProviderEndpoint { base_url, api_key }))
    };

    let env = parse_environment(&or_default("COPYDECK_ENV", "development"));

    let bind_addr = or_default("COPYDECK_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("COPYDECK_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("COPYDECK_LOG_LEVEL", "info");

    let durable_cache = pair("COPYDECK_CACHE_URL", "COPYDECK_CACHE_TOKEN")?
        .map(|(url, token)| DurableCacheConfig { url, token });
    let cache_ttl_secs = parse_u64("COPYDECK_CACHE_TTL_SECS", "86400")?;
    let cache_sweep_cron = or_default("COPYDECK_CACHE_SWEEP_CRON", "0 */5 * * * *");

    let retry_max_attempts = parse_u32("COPYDECK_RETRY_MAX_ATTEMPTS", "3")?;
    if retry_max_attempts == 0 {
        return Err(invalid(
            "COPYDECK_RETRY_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let retry_base_delay_ms = parse_u64("COPYDECK_RETRY_BASE_DELAY_MS", "1000")?;
    let retry_jitter = parse_bool("COPYDECK_RETRY_JITTER", "false")?;

    let http_timeout_secs = parse_u64("COPYDECK_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("COPYDECK_USER_AGENT", "copydeck/0.1 (strategic-analytics)");

    let search_interest = provider("SEARCH_INTEREST_API_URL", "SEARCH_INTEREST_API_KEY")?;
    let keyword_metrics = provider("KEYWORD_METRICS_API_URL", "KEYWORD_METRICS_API_KEY")?;
    let competitors = provider("COMPETITOR_API_URL", "COMPETITOR_API_KEY")?;
    let audience = provider("AUDIENCE_API_URL", "AUDIENCE_API_KEY")?;

    let narrative = optional("NARRATIVE_API_KEY").map(|api_key| NarrativeEndpoint {
        base_url: or_default("NARRATIVE_API_URL", DEFAULT_NARRATIVE_URL),
        api_key,
        model: or_default("NARRATIVE_MODEL", "gpt-4o-mini"),
    });

    let rate_limit_per_minute = parse_usize("COPYDECK_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        durable_cache,
        cache_ttl_secs,
        cache_sweep_cron,
        retry_max_attempts,
        retry_base_delay_ms,
        retry_jitter,
        http_timeout_secs,
        user_agent,
        search_interest,
        keyword_metrics,
        competitors,
        audience,
        narrative,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
