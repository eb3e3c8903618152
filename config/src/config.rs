//! # Configuration Structures
//!
//! This module defines all configuration structures for the commentary
//! gateway.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Fall back to documented defaults for every missing field

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Main configuration structure for the commentary gateway.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates every tunable of the gateway: the HTTP listener, admission
/// control, the quantized cache, the upstream inference service and
/// observability.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Short window limit: {}", config.rate_limit.short_limit);
/// ```
///
/// ## Fields
/// - `server`: Listener address and background job cadence
/// - `rate_limit`: Per-client sliding windows
/// - `cache`: Bucket granularity, TTL and capacity
/// - `upstream`: Inference provider, timeout and retry policy
/// - `observability`: Logging, metrics and stats window
///
/// ## Validation
/// All nested configurations must pass their own validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    /// Admission control configuration
    #[serde(default)]
    #[validate(nested)]
    pub rate_limit: RateLimitConfig,

    /// Quantized cache configuration
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Upstream inference service configuration
    #[serde(default)]
    #[validate(nested)]
    pub upstream: UpstreamConfig,

    /// Observability configuration (logging, metrics, stats)
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

/// HTTP listener configuration.
///
/// ## Fields
/// - `host`: Bind address (default: "0.0.0.0")
/// - `port`: Bind port (default: 8787)
/// - `janitor_interval_seconds`: How often idle rate-limit windows are
///   dropped (default: 300)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[serde(default = "default_server_port")]
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[serde(default = "default_janitor_interval")]
    #[validate(range(min = 1, max = 86400))]
    pub janitor_interval_seconds: u64
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8787
}

fn default_janitor_interval() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            janitor_interval_seconds: default_janitor_interval()
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_seconds)
    }
}

/// Per-client admission control.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Two sliding windows per client. The short window is checked first, so a
/// burst is reported against it before the long window.
///
/// ## Fields
/// - `short_window_seconds`: Short window length (default: 60)
/// - `short_limit`: Requests allowed per short window (default: 10)
/// - `long_window_seconds`: Long window length (default: 3600)
/// - `long_limit`: Requests allowed per long window (default: 100)
///
/// ## Validation
/// - Every value must be at least 1
/// - The long window must be strictly longer than the short window
/// - The long limit must not be below the short limit
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_rate_limit_windows"))]
pub struct RateLimitConfig {
    #[serde(default = "default_short_window")]
    #[validate(range(min = 1))]
    pub short_window_seconds: u64,

    #[serde(default = "default_short_limit")]
    #[validate(range(min = 1))]
    pub short_limit: u32,

    #[serde(default = "default_long_window")]
    #[validate(range(min = 1))]
    pub long_window_seconds: u64,

    #[serde(default = "default_long_limit")]
    #[validate(range(min = 1))]
    pub long_limit: u32
}

fn default_short_window() -> u64 {
    60
}

fn default_short_limit() -> u32 {
    10
}

fn default_long_window() -> u64 {
    3600
}

fn default_long_limit() -> u32 {
    100
}

fn validate_rate_limit_windows(config: &RateLimitConfig) -> Result<(), validator::ValidationError> {
    if config.long_window_seconds <= config.short_window_seconds {
        return Err(validator::ValidationError::new(
            "long_window_seconds must be greater than short_window_seconds"
        ));
    }
    if config.long_limit < config.short_limit {
        return Err(validator::ValidationError::new(
            "long_limit must not be lower than short_limit"
        ));
    }
    Ok(())
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            short_window_seconds: default_short_window(),
            short_limit: default_short_limit(),
            long_window_seconds: default_long_window(),
            long_limit: default_long_limit()
        }
    }
}

impl RateLimitConfig {
    pub fn short_window(&self) -> Duration {
        Duration::from_secs(self.short_window_seconds)
    }

    pub fn long_window(&self) -> Duration {
        Duration::from_secs(self.long_window_seconds)
    }
}

/// Quantized result cache.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Controls how request parameters are bucketed into cache keys and how long
/// and how many results are kept.
///
/// ## Fields
/// - `enabled`: Serve and store cached results (default: true)
/// - `ttl_seconds`: Maximum age of a served entry (default: 3600)
/// - `max_entries`: Capacity before least-recently-used eviction (default: 1000)
/// - `rate_step`: Bucket width for the policy rate (default: 0.25)
/// - `fx_step`: Bucket width for the FX rate (default: 10.0)
/// - `asset_step`: Bucket width for both asset values (default: 1000.0)
/// - `bond_step`: Bucket width for the bond index (default: 1.0)
///
/// ## Validation
/// - `ttl_seconds`: 1-86400
/// - `max_entries`: 1-1000000
/// - Every step must be finite and greater than zero
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_ttl")]
    #[validate(range(min = 1, max = 86400))]
    pub ttl_seconds: u64,

    #[serde(default = "default_cache_max_entries")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_entries: usize,

    #[serde(default = "default_rate_step")]
    #[validate(custom(function = "validate_bucket_step"))]
    pub rate_step: f64,

    #[serde(default = "default_fx_step")]
    #[validate(custom(function = "validate_bucket_step"))]
    pub fx_step: f64,

    #[serde(default = "default_asset_step")]
    #[validate(custom(function = "validate_bucket_step"))]
    pub asset_step: f64,

    #[serde(default = "default_bond_step")]
    #[validate(custom(function = "validate_bucket_step"))]
    pub bond_step: f64
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_max_entries() -> usize {
    1000
}

fn default_rate_step() -> f64 {
    0.25
}

fn default_fx_step() -> f64 {
    10.0
}

fn default_asset_step() -> f64 {
    1000.0
}

fn default_bond_step() -> f64 {
    1.0
}

fn validate_bucket_step(value: f64) -> Result<(), validator::ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(validator::ValidationError::new(
            "Bucket step must be a finite number greater than zero"
        ))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
            rate_step: default_rate_step(),
            fx_step: default_fx_step(),
            asset_step: default_asset_step(),
            bond_step: default_bond_step()
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Upstream inference service.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Selects the inference strategy and bounds how long and how often it is
/// called.
///
/// ## Fields
/// - `provider`: "openai", "synthetic" or "auto" (default: "auto"); "auto"
///   uses OpenAI when an API key is present and the synthetic backend
///   otherwise
/// - `api_url`: Base URL of an OpenAI-compatible API
/// - `model`: Chat model name
/// - `max_tokens`: Completion token cap (default: 500)
/// - `temperature`: Sampling temperature (default: 0.7)
/// - `timeout_ms`: Per-attempt timeout (default: 30000)
/// - `api_key`: Bearer credential; never serialized or logged
/// - `retry`: Retry and backoff policy
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_provider")]
    #[validate(custom(function = "validate_provider"))]
    pub provider: String,

    #[serde(default = "default_upstream_api_url")]
    #[validate(length(min = 1, max = 2048))]
    pub api_url: String,

    #[serde(default = "default_upstream_model")]
    #[validate(length(min = 1, max = 255))]
    pub model: String,

    #[serde(default = "default_upstream_max_tokens")]
    #[validate(range(min = 1, max = 32768))]
    pub max_tokens: u32,

    #[serde(default = "default_upstream_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    #[serde(default = "default_upstream_timeout_ms")]
    #[validate(range(min = 100, max = 120000))]
    pub timeout_ms: u64,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig
}

fn default_upstream_provider() -> String {
    "auto".to_string()
}

fn default_upstream_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_upstream_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_upstream_max_tokens() -> u32 {
    500
}

fn default_upstream_temperature() -> f32 {
    0.7
}

fn default_upstream_timeout_ms() -> u64 {
    30000
}

fn validate_provider(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "openai" | "synthetic" | "auto" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid upstream provider"))
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: default_upstream_provider(),
            api_url: default_upstream_api_url(),
            model: default_upstream_model(),
            max_tokens: default_upstream_max_tokens(),
            temperature: default_upstream_temperature(),
            timeout_ms: default_upstream_timeout_ms(),
            api_key: None,
            retry: RetryConfig::default()
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_ms", &self.timeout_ms)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("retry", &self.retry)
            .finish()
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

/// Retry and backoff policy for upstream calls.
///
/// The delay before retry `n` (0-indexed) is
/// `min(base_delay_ms * backoff_multiplier^n, max_delay_ms)` plus a uniform
/// jitter in `[0, max_jitter_ms)`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_retry_delays"))]
pub struct RetryConfig {
    /// Additional attempts after the first one
    #[serde(default = "default_max_retries")]
    #[validate(range(min = 0, max = 10))]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    #[validate(range(min = 1, max = 60000))]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    #[validate(range(min = 1.0, max = 10.0))]
    pub backoff_multiplier: f64,

    #[serde(default = "default_max_delay_ms")]
    #[validate(range(min = 1, max = 300000))]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_jitter_ms")]
    #[validate(range(max = 60000))]
    pub max_jitter_ms: u64
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

fn validate_retry_delays(config: &RetryConfig) -> Result<(), validator::ValidationError> {
    if config.max_delay_ms < config.base_delay_ms {
        return Err(validator::ValidationError::new(
            "max_delay_ms must not be lower than base_delay_ms"
        ));
    }
    Ok(())
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter_ms: default_max_jitter_ms()
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }
}

/// Observability configuration.
///
/// ## Fields
/// - `logging_level`: Default log filter when `RUST_LOG` is unset (default:
///   "info")
/// - `json_logs`: Emit JSON-formatted logs (default: false)
/// - `metrics_enabled`: Install the Prometheus recorder and serve `/metrics`
///   (default: true)
/// - `stats_window_seconds`: Rolling window for `/api/stats` (default: 300)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_observability_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String,

    #[serde(default)]
    pub json_logs: bool,

    #[serde(default = "default_observability_metrics_enabled")]
    pub metrics_enabled: bool,

    #[serde(default = "default_stats_window")]
    #[validate(range(min = 1, max = 86400))]
    pub stats_window_seconds: u64
}

fn default_observability_logging_level() -> String {
    "info".to_string()
}

fn default_observability_metrics_enabled() -> bool {
    true
}

fn default_stats_window() -> u64 {
    300
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level"))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: default_observability_logging_level(),
            json_logs: false,
            metrics_enabled: default_observability_metrics_enabled(),
            stats_window_seconds: default_stats_window()
        }
    }
}
