use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(parse_environment("development"), Environment::Development);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn empty_env_yields_in_memory_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should load");

    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.durable_cache.is_none());
    assert_eq!(cfg.cache_ttl_secs, 86_400);
    assert_eq!(cfg.cache_sweep_cron, "0 */5 * * * *");
    assert_eq!(cfg.retry_max_attempts, 3);
    assert_eq!(cfg.retry_base_delay_ms, 1_000);
    assert!(!cfg.retry_jitter);
    assert_eq!(cfg.http_timeout_secs, 30);
    assert!(cfg.search_interest.is_none());
    assert!(cfg.keyword_metrics.is_none());
    assert!(cfg.competitors.is_none());
    assert!(cfg.audience.is_none());
    assert!(cfg.narrative.is_none());
    assert_eq!(cfg.rate_limit_per_minute, 120);
}

#[test]
fn durable_cache_selected_when_url_and_token_present() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_CACHE_URL", "https://kv.example.com");
    map.insert("COPYDECK_CACHE_TOKEN", "secret");
    let cfg = build_app_config(lookup_from_map(&map)).expect("should load");

    let cache = cfg.durable_cache.expect("durable cache configured");
    assert_eq!(cache.url, "https://kv.example.com");
    assert_eq!(cache.token, "secret");
}

#[test]
fn cache_url_without_token_is_rejected() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_CACHE_URL", "https://kv.example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "COPYDECK_CACHE_TOKEN"),
        "expected MissingEnvVar(COPYDECK_CACHE_TOKEN), got: {result:?}"
    );
}

#[test]
fn provider_key_without_url_is_rejected() {
    let mut map = HashMap::new();
    map.insert("COMPETITOR_API_KEY", "k");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "COMPETITOR_API_URL"),
        "expected MissingEnvVar(COMPETITOR_API_URL), got: {result:?}"
    );
}

#[test]
fn blank_values_count_as_absent() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_CACHE_URL", "   ");
    map.insert("COPYDECK_CACHE_TOKEN", "");
    let cfg = build_app_config(lookup_from_map(&map)).expect("should load");
    assert!(cfg.durable_cache.is_none());
}

#[test]
fn zero_retry_attempts_is_rejected() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_RETRY_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COPYDECK_RETRY_MAX_ATTEMPTS"),
        "got: {result:?}"
    );
}

#[test]
fn non_numeric_ttl_is_rejected() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_CACHE_TTL_SECS", "a day");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COPYDECK_CACHE_TTL_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn jitter_flag_accepts_common_spellings() {
    for (raw, expected) in [("true", true), ("1", true), ("off", false), ("No", false)] {
        let mut map = HashMap::new();
        map.insert("COPYDECK_RETRY_JITTER", raw);
        let cfg = build_app_config(lookup_from_map(&map)).expect("should load");
        assert_eq!(cfg.retry_jitter, expected, "input {raw}");
    }

    let mut map = HashMap::new();
    map.insert("COPYDECK_RETRY_JITTER", "maybe");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn narrative_uses_default_url_and_model() {
    let mut map = HashMap::new();
    map.insert("NARRATIVE_API_KEY", "sk-test");
    let cfg = build_app_config(lookup_from_map(&map)).expect("should load");

    let narrative = cfg.narrative.expect("narrative configured");
    assert_eq!(narrative.base_url, "https://api.openai.com");
    assert_eq!(narrative.model, "gpt-4o-mini");
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_CACHE_URL", "https://kv.example.com");
    map.insert("COPYDECK_CACHE_TOKEN", "cache-secret");
    map.insert("AUDIENCE_API_URL", "https://audience.example.com");
    map.insert("AUDIENCE_API_KEY", "audience-secret");
    let cfg = build_app_config(lookup_from_map(&map)).expect("should load");

    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("cache-secret"));
    assert!(!rendered.contains("audience-secret"));
    assert!(rendered.contains("https://audience.example.com"));
}

#[test]
fn cache_sweep_cron_can_be_overridden() {
    let mut map = HashMap::new();
    map.insert("COPYDECK_CACHE_SWEEP_CRON", "0 0 * * * *");
    let cfg = build_app_config(lookup_from_map(&map)).expect("should load");
    assert_eq!(cfg.cache_sweep_cron, "0 0 * * * *");
}
