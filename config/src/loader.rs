//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! - `GW_*`: Server settings
//! - `RL_*`: Rate limit settings
//! - `CA_*`: Cache settings
//! - `UP_*`: Upstream inference settings
//! - `OB_*`: Observability settings

use crate::config::{
    CacheConfig, Config, ObservabilityConfig, RateLimitConfig, RetryConfig, ServerConfig,
    UpstreamConfig
};
use std::env;

/// Load configuration from environment variables.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from environment variables. Unset variables keep
/// their default value, so the result can be merged over a file
/// configuration with [`crate::merge_configs`].
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Listening on {}", config.server.bind_address());
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Server Settings (`GW_*`)
/// - `GW_HOST`: Bind address (default: "0.0.0.0")
/// - `GW_PORT`: Bind port (default: 8787)
/// - `GW_JANITOR_INTERVAL_SECONDS`: Idle window cleanup cadence (default: 300)
///
/// ### Rate Limit Settings (`RL_*`)
/// - `RL_SHORT_WINDOW_SECONDS` (default: 60), `RL_SHORT_LIMIT` (default: 10)
/// - `RL_LONG_WINDOW_SECONDS` (default: 3600), `RL_LONG_LIMIT` (default: 100)
///
/// ### Cache Settings (`CA_*`)
/// - `CA_ENABLED`: Enable the cache (true/false, default: true)
/// - `CA_TTL_SECONDS`: Entry lifetime (default: 3600)
/// - `CA_MAX_ENTRIES`: Capacity (default: 1000)
/// - `CA_RATE_STEP`, `CA_FX_STEP`, `CA_ASSET_STEP`, `CA_BOND_STEP`: Bucket
///   widths (defaults: 0.25, 10, 1000, 1)
///
/// ### Upstream Settings (`UP_*`)
/// - `UP_PROVIDER`: openai/synthetic/auto (default: auto)
/// - `UP_API_URL`, `UP_MODEL`, `UP_MAX_TOKENS`, `UP_TEMPERATURE`
/// - `UP_TIMEOUT_MS`: Per-attempt timeout (default: 30000)
/// - `UP_API_KEY`: Bearer credential, falls back to `OPENAI_API_KEY`
/// - `UP_MAX_RETRIES`, `UP_BASE_DELAY_MS`, `UP_BACKOFF_MULTIPLIER`,
///   `UP_MAX_DELAY_MS`, `UP_MAX_JITTER_MS`
///
/// ### Observability Settings (`OB_*`)
/// - `OB_LOGGING_LEVEL`: Logging level (trace/debug/info/warn/error, default:
///   "info")
/// - `OB_JSON_LOGS`: JSON log output (true/false, default: false)
/// - `OB_METRICS_ENABLED`: Enable metrics (true/false, default: true)
/// - `OB_STATS_WINDOW_SECONDS`: Stats rolling window (default: 300)
pub fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config {
        server: load_server_from_env()?,
        rate_limit: load_rate_limit_from_env()?,
        cache: load_cache_from_env()?,
        upstream: load_upstream_from_env()?,
        observability: load_observability_from_env()?
    };

    Ok(config)
}

fn load_server_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let defaults = ServerConfig::default();
    Ok(ServerConfig {
        host: env::var("GW_HOST").unwrap_or(defaults.host),
        port: parse_env("GW_PORT").unwrap_or(defaults.port),
        janitor_interval_seconds: parse_env("GW_JANITOR_INTERVAL_SECONDS")
            .unwrap_or(defaults.janitor_interval_seconds)
    })
}

fn load_rate_limit_from_env() -> Result<RateLimitConfig, Box<dyn std::error::Error>> {
    let defaults = RateLimitConfig::default();
    Ok(RateLimitConfig {
        short_window_seconds: parse_env("RL_SHORT_WINDOW_SECONDS")
            .unwrap_or(defaults.short_window_seconds),
        short_limit: parse_env("RL_SHORT_LIMIT").unwrap_or(defaults.short_limit),
        long_window_seconds: parse_env("RL_LONG_WINDOW_SECONDS")
            .unwrap_or(defaults.long_window_seconds),
        long_limit: parse_env("RL_LONG_LIMIT").unwrap_or(defaults.long_limit)
    })
}

fn load_cache_from_env() -> Result<CacheConfig, Box<dyn std::error::Error>> {
    let defaults = CacheConfig::default();
    Ok(CacheConfig {
        enabled: parse_env("CA_ENABLED").unwrap_or(defaults.enabled),
        ttl_seconds: parse_env("CA_TTL_SECONDS").unwrap_or(defaults.ttl_seconds),
        max_entries: parse_env("CA_MAX_ENTRIES").unwrap_or(defaults.max_entries),
        rate_step: parse_env("CA_RATE_STEP").unwrap_or(defaults.rate_step),
        fx_step: parse_env("CA_FX_STEP").unwrap_or(defaults.fx_step),
        asset_step: parse_env("CA_ASSET_STEP").unwrap_or(defaults.asset_step),
        bond_step: parse_env("CA_BOND_STEP").unwrap_or(defaults.bond_step)
    })
}

fn load_upstream_from_env() -> Result<UpstreamConfig, Box<dyn std::error::Error>> {
    let defaults = UpstreamConfig::default();
    let api_key = env::var("UP_API_KEY")
        .or_else(|_| env::var("OPENAI_API_KEY"))
        .ok()
        .filter(|key| !key.trim().is_empty());

    Ok(UpstreamConfig {
        provider: env::var("UP_PROVIDER").unwrap_or(defaults.provider),
        api_url: env::var("UP_API_URL").unwrap_or(defaults.api_url),
        model: env::var("UP_MODEL").unwrap_or(defaults.model),
        max_tokens: parse_env("UP_MAX_TOKENS").unwrap_or(defaults.max_tokens),
        temperature: parse_env("UP_TEMPERATURE").unwrap_or(defaults.temperature),
        timeout_ms: parse_env("UP_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
        api_key,
        retry: load_retry_from_env()?
    })
}

fn load_retry_from_env() -> Result<RetryConfig, Box<dyn std::error::Error>> {
    let defaults = RetryConfig::default();
    Ok(RetryConfig {
        max_retries: parse_env("UP_MAX_RETRIES").unwrap_or(defaults.max_retries),
        base_delay_ms: parse_env("UP_BASE_DELAY_MS").unwrap_or(defaults.base_delay_ms),
        backoff_multiplier: parse_env("UP_BACKOFF_MULTIPLIER")
            .unwrap_or(defaults.backoff_multiplier),
        max_delay_ms: parse_env("UP_MAX_DELAY_MS").unwrap_or(defaults.max_delay_ms),
        max_jitter_ms: parse_env("UP_MAX_JITTER_MS").unwrap_or(defaults.max_jitter_ms)
    })
}

fn load_observability_from_env() -> Result<ObservabilityConfig, Box<dyn std::error::Error>> {
    let defaults = ObservabilityConfig::default();
    Ok(ObservabilityConfig {
        logging_level: env::var("OB_LOGGING_LEVEL").unwrap_or(defaults.logging_level),
        json_logs: parse_env("OB_JSON_LOGS").unwrap_or(defaults.json_logs),
        metrics_enabled: parse_env("OB_METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
        stats_window_seconds: parse_env("OB_STATS_WINDOW_SECONDS")
            .unwrap_or(defaults.stats_window_seconds)
    })
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    match env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        let config = load_from_env().unwrap();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.rate_limit.short_limit, 10);
        assert_eq!(config.cache.ttl_seconds, 3600);
    }

    #[test]
    #[serial]
    fn test_load_rate_limit_from_env() {
        unsafe {
            env::set_var("RL_SHORT_WINDOW_SECONDS", "30");
            env::set_var("RL_SHORT_LIMIT", "5");
            env::set_var("RL_LONG_WINDOW_SECONDS", "600");
            env::set_var("RL_LONG_LIMIT", "50");
        }

        let rate_limit = load_rate_limit_from_env().unwrap();

        unsafe {
            env::remove_var("RL_SHORT_WINDOW_SECONDS");
            env::remove_var("RL_SHORT_LIMIT");
            env::remove_var("RL_LONG_WINDOW_SECONDS");
            env::remove_var("RL_LONG_LIMIT");
        }

        assert_eq!(rate_limit.short_window_seconds, 30);
        assert_eq!(rate_limit.short_limit, 5);
        assert_eq!(rate_limit.long_window_seconds, 600);
        assert_eq!(rate_limit.long_limit, 50);
    }

    #[test]
    #[serial]
    fn test_load_cache_from_env() {
        unsafe {
            env::set_var("CA_ENABLED", "false");
            env::set_var("CA_TTL_SECONDS", "120");
            env::set_var("CA_MAX_ENTRIES", "42");
            env::set_var("CA_RATE_STEP", "0.5");
        }

        let cache = load_cache_from_env().unwrap();

        unsafe {
            env::remove_var("CA_ENABLED");
            env::remove_var("CA_TTL_SECONDS");
            env::remove_var("CA_MAX_ENTRIES");
            env::remove_var("CA_RATE_STEP");
        }

        assert!(!cache.enabled);
        assert_eq!(cache.ttl_seconds, 120);
        assert_eq!(cache.max_entries, 42);
        assert_eq!(cache.rate_step, 0.5);
        assert_eq!(cache.fx_step, 10.0);
    }

    #[test]
    #[serial]
    fn test_load_upstream_from_env() {
        unsafe {
            env::set_var("UP_PROVIDER", "openai");
            env::set_var("UP_MODEL", "gpt-test");
            env::set_var("UP_TIMEOUT_MS", "5000");
            env::set_var("UP_MAX_RETRIES", "5");
            env::set_var("UP_BACKOFF_MULTIPLIER", "1.5");
            env::set_var("UP_API_KEY", "sk-env");
        }

        let upstream = load_upstream_from_env().unwrap();

        unsafe {
            env::remove_var("UP_PROVIDER");
            env::remove_var("UP_MODEL");
            env::remove_var("UP_TIMEOUT_MS");
            env::remove_var("UP_MAX_RETRIES");
            env::remove_var("UP_BACKOFF_MULTIPLIER");
            env::remove_var("UP_API_KEY");
        }

        assert_eq!(upstream.provider, "openai");
        assert_eq!(upstream.model, "gpt-test");
        assert_eq!(upstream.timeout_ms, 5000);
        assert_eq!(upstream.retry.max_retries, 5);
        assert_eq!(upstream.retry.backoff_multiplier, 1.5);
        assert_eq!(upstream.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    #[serial]
    fn test_api_key_falls_back_to_openai_variable() {
        unsafe {
            env::remove_var("UP_API_KEY");
            env::set_var("OPENAI_API_KEY", "sk-fallback");
        }

        let upstream = load_upstream_from_env().unwrap();

        unsafe {
            env::remove_var("OPENAI_API_KEY");
        }

        assert_eq!(upstream.api_key.as_deref(), Some("sk-fallback"));
    }

    #[test]
    #[serial]
    fn test_unparseable_value_keeps_default() {
        unsafe {
            env::set_var("GW_PORT", "not-a-port");
        }

        let server = load_server_from_env().unwrap();

        unsafe {
            env::remove_var("GW_PORT");
        }

        assert_eq!(server.port, 8787);
    }
}
