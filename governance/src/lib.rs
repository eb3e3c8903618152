//! # Request Governance
//!
//! Keeps cost and latency bounded in front of a slow, rate-limited,
//! pay-per-call inference service.
//!
//! - [`RateLimiter`]: per-client admission over a short and a long sliding
//!   window
//! - [`QuantizedCache`]: TTL + LRU cache keyed by bucketed parameters
//! - [`ResilientClient`]: per-attempt timeout, bounded retry, exponential
//!   backoff with jitter
//! - [`RequestPipeline`]: validate, admit, look up, call, store
//!
//! All state is owned by explicit instances; nothing here is global.

pub mod backoff;
pub mod cache;
pub mod pipeline;
pub mod rate_limiter;
pub mod resilient;
pub mod telemetry;

pub use backoff::BackoffSchedule;
pub use cache::{CacheKey, CacheStats, Granularity, QuantizedCache};
pub use pipeline::{PipelineResponse, RequestPipeline};
pub use rate_limiter::{Decision, RateLimiter};
pub use resilient::{ResilientClient, UpstreamOutcome};
pub use telemetry::GatewayTelemetry;
