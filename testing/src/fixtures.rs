use config::{CacheConfig, RateLimitConfig, RetryConfig};
use gw_core::MarketInput;
use serde_json::{Value, json};

/// `{rate=3.5, fx=1250, assetA=85000, assetB=120000, bondIdx=95}`
pub fn scenario_a_input() -> MarketInput {
    MarketInput::new(3.5, 1250.0, 85000.0, 120000.0, 95.0)
}

/// Scenario A with an out-of-bounds policy rate.
pub fn scenario_b_input() -> MarketInput {
    MarketInput::new(-10.0, 1250.0, 85000.0, 120000.0, 95.0)
}

pub fn scenario_a_body() -> Value {
    json!({
        "rate": 3.5,
        "fx": 1250,
        "assetA": 85000,
        "assetB": 120000,
        "bondIdx": 95
    })
}

/// Default windows: 10 per 60s, 100 per hour.
pub fn rate_limit_config() -> RateLimitConfig {
    RateLimitConfig::default()
}

pub fn cache_config() -> CacheConfig {
    CacheConfig::default()
}

/// Retry policy with whole-second delays and no jitter, so elapsed time on
/// a paused tokio clock is exact.
pub fn deterministic_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 1000,
        backoff_multiplier: 2.0,
        max_delay_ms: 30000,
        max_jitter_ms: 0
    }
}
