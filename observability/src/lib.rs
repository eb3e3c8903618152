//! # Observability
//!
//! Rolling request statistics backing the `/api/stats` endpoint. Prometheus
//! metrics are emitted separately through the `metrics` facade.

pub mod request_stats;

pub use request_stats::{EndpointCount, RequestRecord, RequestStats, StatsSnapshot};
