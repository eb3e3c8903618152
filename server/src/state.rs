//! Shared application state.

use config::Config;
use governance::RequestPipeline;
use gw_core::InferenceBackend;
use metrics_exporter_prometheus::PrometheusHandle;
use observability::RequestStats;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State handed to every handler.
pub struct AppState {
    pub pipeline: Arc<RequestPipeline>,
    pub stats: Arc<RequestStats>,
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant
}

impl AppState {
    pub fn new(config: &Config, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            pipeline: Arc::new(RequestPipeline::from_config(config, backend)),
            stats: Arc::new(RequestStats::new(Duration::from_secs(
                config.observability.stats_window_seconds
            ))),
            metrics: None,
            started_at: Instant::now()
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// True when commentary is produced without a real model.
    pub fn is_degraded(&self) -> bool {
        self.pipeline.backend().is_synthetic()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
