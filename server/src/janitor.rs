use governance::RequestPipeline;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

/// Periodically drops rate-limiter state for clients that went idle.
pub struct JanitorJob {
    pipeline: Arc<RequestPipeline>,
    interval: Duration
}

impl JanitorJob {
    pub fn new(pipeline: Arc<RequestPipeline>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    pub fn run_once(&self) -> usize {
        let removed = self.pipeline.rate_limiter().prune_idle();
        if removed > 0 {
            info!(
                removed,
                remaining = self.pipeline.rate_limiter().tracked_clients(),
                "Pruned idle client windows"
            );
        } else {
            debug!("No idle client windows to prune");
        }
        removed
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.run_once();
            }
        })
    }
}
