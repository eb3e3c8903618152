//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)

use crate::config::{
    CacheConfig, Config, ObservabilityConfig, RateLimitConfig, RetryConfig, ServerConfig,
    UpstreamConfig
};
use std::fmt::Display;

/// Flags supplied on the command line.
///
/// Every `Some` is applied as-is after the file and environment sources are
/// merged, including values that happen to equal the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub provider: Option<String>
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.provider.is_none()
    }

    fn apply(&self, config: &mut Config, source_name: &str) {
        let mut changes = Vec::new();
        if let Some(host) = &self.host {
            changes.push(format!("server.host = {host}"));
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            changes.push(format!("server.port = {port}"));
            config.server.port = port;
        }
        if let Some(provider) = &self.provider {
            changes.push(format!("upstream.provider = {provider}"));
            config.upstream.provider.clone_from(provider);
        }

        if !changes.is_empty() {
            tracing::debug!("Configuration from {}: {:?}", source_name, changes);
        }
    }
}

/// Merge multiple configuration sources with precedence.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Merges configuration from multiple sources following precedence rules:
/// CLI arguments > environment variables > config file > defaults.
///
/// ## Usage
/// ```rust,no_run
/// use config::{Config, ConfigOverrides, merge_configs, load_from_file, load_from_env};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let defaults = Config::default();
///     let from_file = load_from_file(Path::new("gateway.toml"))?;
///     let from_env = load_from_env()?;
///
///     let _config = merge_configs(
///         defaults,
///         from_file,
///         "file",
///         from_env,
///         "env",
///         &ConfigOverrides::default(),
///         "cli"
///     );
///     Ok(())
/// }
/// ```
///
/// ## Semantics
/// The file and environment sources override a field only when their value
/// differs from the built-in default, so a source that leaves a field unset
/// never clobbers a value supplied by a lower-priority source. CLI flags are
/// explicit and always win when present. Every applied override is logged at
/// debug level; the API key is logged as `***`.
pub fn merge_configs(
    defaults: Config,
    file_config: Config,
    file_source_name: &str,
    env_config: Config,
    env_source_name: &str,
    cli_overrides: &ConfigOverrides,
    cli_source_name: &str
) -> Config {
    let mut config = defaults;

    config = merge_with_logging(config, file_config, file_source_name);
    config = merge_with_logging(config, env_config, env_source_name);
    cli_overrides.apply(&mut config, cli_source_name);

    config
}

fn merge_with_logging(mut base: Config, override_config: Config, source_name: &str) -> Config {
    let mut changes = Vec::new();

    merge_server(&mut base.server, &override_config.server, &mut changes);
    merge_rate_limit(&mut base.rate_limit, &override_config.rate_limit, &mut changes);
    merge_cache(&mut base.cache, &override_config.cache, &mut changes);
    merge_upstream(&mut base.upstream, &override_config.upstream, &mut changes);
    merge_observability(&mut base.observability, &override_config.observability, &mut changes);

    if !changes.is_empty() {
        tracing::debug!("Configuration from {}: {:?}", source_name, changes);
    }

    base
}

fn merge_field<T>(base: &mut T, value: &T, default: &T, path: &str, changes: &mut Vec<String>)
where
    T: PartialEq + Clone + Display
{
    if value != default && value != base {
        changes.push(format!("{path} = {value}"));
        base.clone_from(value);
    }
}

fn merge_server(base: &mut ServerConfig, over: &ServerConfig, changes: &mut Vec<String>) {
    let d = ServerConfig::default();
    merge_field(&mut base.host, &over.host, &d.host, "server.host", changes);
    merge_field(&mut base.port, &over.port, &d.port, "server.port", changes);
    merge_field(
        &mut base.janitor_interval_seconds,
        &over.janitor_interval_seconds,
        &d.janitor_interval_seconds,
        "server.janitor_interval_seconds",
        changes
    );
}

fn merge_rate_limit(base: &mut RateLimitConfig, over: &RateLimitConfig, changes: &mut Vec<String>) {
    let d = RateLimitConfig::default();
    merge_field(
        &mut base.short_window_seconds,
        &over.short_window_seconds,
        &d.short_window_seconds,
        "rate_limit.short_window_seconds",
        changes
    );
    merge_field(
        &mut base.short_limit,
        &over.short_limit,
        &d.short_limit,
        "rate_limit.short_limit",
        changes
    );
    merge_field(
        &mut base.long_window_seconds,
        &over.long_window_seconds,
        &d.long_window_seconds,
        "rate_limit.long_window_seconds",
        changes
    );
    merge_field(
        &mut base.long_limit,
        &over.long_limit,
        &d.long_limit,
        "rate_limit.long_limit",
        changes
    );
}

fn merge_cache(base: &mut CacheConfig, over: &CacheConfig, changes: &mut Vec<String>) {
    let d = CacheConfig::default();
    merge_field(&mut base.enabled, &over.enabled, &d.enabled, "cache.enabled", changes);
    merge_field(
        &mut base.ttl_seconds,
        &over.ttl_seconds,
        &d.ttl_seconds,
        "cache.ttl_seconds",
        changes
    );
    merge_field(
        &mut base.max_entries,
        &over.max_entries,
        &d.max_entries,
        "cache.max_entries",
        changes
    );
    merge_field(&mut base.rate_step, &over.rate_step, &d.rate_step, "cache.rate_step", changes);
    merge_field(&mut base.fx_step, &over.fx_step, &d.fx_step, "cache.fx_step", changes);
    merge_field(
        &mut base.asset_step,
        &over.asset_step,
        &d.asset_step,
        "cache.asset_step",
        changes
    );
    merge_field(&mut base.bond_step, &over.bond_step, &d.bond_step, "cache.bond_step", changes);
}

fn merge_upstream(base: &mut UpstreamConfig, over: &UpstreamConfig, changes: &mut Vec<String>) {
    let d = UpstreamConfig::default();
    merge_field(
        &mut base.provider,
        &over.provider,
        &d.provider,
        "upstream.provider",
        changes
    );
    merge_field(&mut base.api_url, &over.api_url, &d.api_url, "upstream.api_url", changes);
    merge_field(&mut base.model, &over.model, &d.model, "upstream.model", changes);
    merge_field(
        &mut base.max_tokens,
        &over.max_tokens,
        &d.max_tokens,
        "upstream.max_tokens",
        changes
    );
    merge_field(
        &mut base.temperature,
        &over.temperature,
        &d.temperature,
        "upstream.temperature",
        changes
    );
    merge_field(
        &mut base.timeout_ms,
        &over.timeout_ms,
        &d.timeout_ms,
        "upstream.timeout_ms",
        changes
    );
    if over.api_key.is_some() && over.api_key != base.api_key {
        changes.push("upstream.api_key = ***".to_string());
        base.api_key.clone_from(&over.api_key);
    }
    merge_retry(&mut base.retry, &over.retry, changes);
}

fn merge_retry(base: &mut RetryConfig, over: &RetryConfig, changes: &mut Vec<String>) {
    let d = RetryConfig::default();
    merge_field(
        &mut base.max_retries,
        &over.max_retries,
        &d.max_retries,
        "upstream.retry.max_retries",
        changes
    );
    merge_field(
        &mut base.base_delay_ms,
        &over.base_delay_ms,
        &d.base_delay_ms,
        "upstream.retry.base_delay_ms",
        changes
    );
    merge_field(
        &mut base.backoff_multiplier,
        &over.backoff_multiplier,
        &d.backoff_multiplier,
        "upstream.retry.backoff_multiplier",
        changes
    );
    merge_field(
        &mut base.max_delay_ms,
        &over.max_delay_ms,
        &d.max_delay_ms,
        "upstream.retry.max_delay_ms",
        changes
    );
    merge_field(
        &mut base.max_jitter_ms,
        &over.max_jitter_ms,
        &d.max_jitter_ms,
        "upstream.retry.max_jitter_ms",
        changes
    );
}

fn merge_observability(
    base: &mut ObservabilityConfig,
    over: &ObservabilityConfig,
    changes: &mut Vec<String>
) {
    let d = ObservabilityConfig::default();
    merge_field(
        &mut base.logging_level,
        &over.logging_level,
        &d.logging_level,
        "observability.logging_level",
        changes
    );
    merge_field(
        &mut base.json_logs,
        &over.json_logs,
        &d.json_logs,
        "observability.json_logs",
        changes
    );
    merge_field(
        &mut base.metrics_enabled,
        &over.metrics_enabled,
        &d.metrics_enabled,
        "observability.metrics_enabled",
        changes
    );
    merge_field(
        &mut base.stats_window_seconds,
        &over.stats_window_seconds,
        &d.stats_window_seconds,
        "observability.stats_window_seconds",
        changes
    );
}
