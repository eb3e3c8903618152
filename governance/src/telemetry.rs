use errors::RateLimitScope;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Emits gateway metrics through the `metrics` facade.
///
/// Without an installed recorder every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayTelemetry;

impl GatewayTelemetry {
    pub fn new() -> Self {
        Self
    }

    pub fn record_request(&self, outcome: &str, duration: Duration) {
        counter!("gateway_requests_total", "outcome" => outcome.to_string()).increment(1);
        histogram!("gateway_request_duration_seconds", "outcome" => outcome.to_string())
            .record(duration.as_secs_f64());
    }

    pub fn record_cache_hit(&self) {
        counter!("gateway_cache_hits_total").increment(1);
    }

    pub fn record_cache_miss(&self) {
        counter!("gateway_cache_misses_total").increment(1);
    }

    pub fn record_cache_size(&self, size: usize) {
        gauge!("gateway_cache_entries").set(size as f64);
    }

    pub fn record_rate_limited(&self, scope: RateLimitScope) {
        counter!("gateway_rate_limited_total", "scope" => scope.as_str()).increment(1);
    }

    pub fn record_upstream_attempt(&self, result: &str) {
        counter!("gateway_upstream_attempts_total", "result" => result.to_string()).increment(1);
    }
}
