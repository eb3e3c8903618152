//! Timeout and bounded retry around a single inference backend.

use crate::backoff::BackoffSchedule;
use crate::telemetry::GatewayTelemetry;
use config::UpstreamConfig;
use errors::{GatewayError, GatewayResult, UpstreamErrorKind, UpstreamFailure};
use gw_core::{Commentary, CommentaryRequest, InferenceBackend};
use std::sync::Arc;
use std::time::Duration;

/// A successful upstream call and how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamOutcome {
    pub commentary: Commentary,
    pub attempts: u32
}

pub struct ResilientClient {
    backend: Arc<dyn InferenceBackend>,
    timeout: Duration,
    max_retries: u32,
    schedule: BackoffSchedule,
    telemetry: GatewayTelemetry
}

impl ResilientClient {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        timeout: Duration,
        max_retries: u32,
        schedule: BackoffSchedule
    ) -> Self {
        Self {
            backend,
            timeout,
            max_retries,
            schedule,
            telemetry: GatewayTelemetry::new()
        }
    }

    pub fn from_config(backend: Arc<dyn InferenceBackend>, config: &UpstreamConfig) -> Self {
        Self::new(
            backend,
            config.timeout(),
            config.retry.max_retries,
            BackoffSchedule::from_config(&config.retry)
        )
    }

    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        &self.backend
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    /// Calls the backend until it succeeds, fails terminally, or the retry
    /// budget (`max_retries + 1` attempts in total) is spent.
    ///
    /// Each attempt runs under `timeout`; an attempt that overruns is
    /// dropped and counts as a retryable failure.
    pub async fn call(&self, request: &CommentaryRequest) -> GatewayResult<UpstreamOutcome> {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let failure = match tokio::time::timeout(self.timeout, self.backend.generate(request))
                .await
            {
                Ok(Ok(commentary)) if !commentary.is_empty() => {
                    self.telemetry.record_upstream_attempt("success");
                    tracing::debug!(
                        backend = self.backend.name(),
                        attempts,
                        "Upstream call succeeded"
                    );
                    return Ok(UpstreamOutcome {
                        commentary,
                        attempts
                    });
                }
                Ok(Ok(_)) => UpstreamFailure::EmptyPayload,
                Ok(Err(failure)) => failure,
                Err(_) => UpstreamFailure::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64
                }
            };

            self.telemetry.record_upstream_attempt(failure.label());

            if !failure.is_retryable() {
                if let UpstreamFailure::Rejected { status, detail } = &failure {
                    tracing::error!(
                        backend = self.backend.name(),
                        status,
                        detail = %detail,
                        "Upstream rejected request"
                    );
                }
                return Err(GatewayError::Upstream {
                    kind: UpstreamErrorKind::Rejected,
                    status: failure.status(),
                    attempts,
                    message: failure.summary()
                });
            }

            if attempts >= max_attempts {
                tracing::error!(
                    backend = self.backend.name(),
                    attempts,
                    last_failure = %failure,
                    "Upstream retries exhausted"
                );
                return Err(exhausted(&failure, attempts));
            }

            let delay = self.schedule.delay(attempts - 1, failure.retry_after());
            tracing::warn!(
                backend = self.backend.name(),
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                failure = %failure,
                "Retrying upstream call"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn exhausted(last: &UpstreamFailure, attempts: u32) -> GatewayError {
    match last {
        UpstreamFailure::Timeout { timeout_ms } => GatewayError::Timeout {
            attempts,
            timeout_ms: *timeout_ms
        },
        _ => GatewayError::Upstream {
            kind: UpstreamErrorKind::RetriesExhausted,
            status: last.status(),
            attempts,
            message: last.summary()
        }
    }
}
