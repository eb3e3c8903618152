//! # Configuration Validation
//!
//! Provides validation for all configuration structures using the `validator` crate.

use crate::config::Config;
use validator::Validate;

/// Validate configuration structure.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Validates all configuration fields using the `validator` crate. Run once
/// after [`crate::merge_configs`]; the gateway refuses to start on failure.
///
/// ## Validation Rules
/// ### Server
/// - `port`: 1-65535
/// - `janitor_interval_seconds`: 1-86400
///
/// ### Rate Limit
/// - every window and limit at least 1
/// - `long_window_seconds` strictly greater than `short_window_seconds`
/// - `long_limit` not below `short_limit`
///
/// ### Cache
/// - `ttl_seconds`: 1-86400
/// - `max_entries`: 1-1000000
/// - every bucket step finite and greater than zero
///
/// ### Upstream
/// - `provider`: must be "openai", "synthetic", or "auto"
/// - `timeout_ms`: 100-120000
/// - `retry.max_retries`: 0-10
/// - `retry.backoff_multiplier`: 1.0-10.0
/// - `retry.max_delay_ms` not below `retry.base_delay_ms`
///
/// ### Observability
/// - `logging_level`: must be "trace", "debug", "info", "warn", or "error"
pub fn validate(config: &Config) -> Result<(), validator::ValidationErrors> {
    config.validate()
}
