//! Request orchestration: validate, admit, look up, call, store.

use crate::cache::QuantizedCache;
use crate::rate_limiter::{Decision, RateLimiter};
use crate::resilient::ResilientClient;
use crate::telemetry::GatewayTelemetry;
use config::Config;
use errors::{GatewayError, GatewayResult};
use gw_core::{ClientId, Commentary, CommentaryRequest, InferenceBackend, MarketInput};
use std::sync::Arc;
use tokio::time::Instant;

/// Successful pipeline result.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResponse {
    pub commentary: Commentary,
    /// Served from cache without an upstream call.
    pub cached: bool,
    /// Upstream attempts made for this request; zero on a cache hit.
    pub attempts: u32,
    pub latency_ms: u64
}

/// Owns one rate limiter, one cache and one resilient client and runs every
/// request through them in order.
///
/// # Flow
/// 1. Validate the input, reporting every violated field. Nothing else runs
///    on failure, so no quota is consumed.
/// 2. Admission check for the caller.
/// 3. Cache lookup on the bucketed key. A key derivation fault is logged and
///    treated as a miss that is not stored.
/// 4. Upstream call; a success is stored before it is returned.
pub struct RequestPipeline {
    limiter: RateLimiter,
    cache: QuantizedCache,
    client: ResilientClient,
    telemetry: GatewayTelemetry
}

impl RequestPipeline {
    pub fn new(limiter: RateLimiter, cache: QuantizedCache, client: ResilientClient) -> Self {
        Self {
            limiter,
            cache,
            client,
            telemetry: GatewayTelemetry::new()
        }
    }

    pub fn from_config(config: &Config, backend: Arc<dyn InferenceBackend>) -> Self {
        Self::new(
            RateLimiter::new(&config.rate_limit),
            QuantizedCache::new(&config.cache),
            ResilientClient::from_config(backend, &config.upstream)
        )
    }

    pub async fn handle(
        &self,
        input: &MarketInput,
        client_id: &ClientId
    ) -> GatewayResult<PipelineResponse> {
        let started = Instant::now();
        let result = self.process(input, client_id, started).await;

        let outcome = match &result {
            Ok(response) if response.cached => "cache_hit",
            Ok(_) => "success",
            Err(err) => err.kind()
        };
        self.telemetry.record_request(outcome, started.elapsed());

        result
    }

    async fn process(
        &self,
        input: &MarketInput,
        client_id: &ClientId,
        started: Instant
    ) -> GatewayResult<PipelineResponse> {
        let params = input.validate().map_err(|violations| {
            tracing::debug!(
                client = %client_id,
                count = violations.len(),
                "Rejected invalid input"
            );
            GatewayError::validation(violations)
        })?;

        if let Decision::Denied { retry_after, scope } = self.limiter.check(client_id) {
            self.telemetry.record_rate_limited(scope);
            tracing::info!(client = %client_id, %scope, retry_after, "Rate limit exceeded");
            return Err(GatewayError::RateLimited { retry_after, scope });
        }

        let key = match self.cache.key(&params) {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::warn!(error = %err, "Cache key derivation failed, treating as miss");
                self.cache.record_miss();
                None
            }
        };

        if let Some(commentary) = key.as_ref().and_then(|key| self.cache.get(key)) {
            self.telemetry.record_cache_hit();
            tracing::debug!(client = %client_id, "Served commentary from cache");
            return Ok(PipelineResponse {
                commentary,
                cached: true,
                attempts: 0,
                latency_ms: elapsed_ms(started)
            });
        }
        self.telemetry.record_cache_miss();

        let outcome = self.client.call(&CommentaryRequest::new(params)).await?;

        if let Some(key) = key {
            self.cache.set(key, outcome.commentary.clone());
            self.telemetry.record_cache_size(self.cache.len());
        }

        Ok(PipelineResponse {
            commentary: outcome.commentary,
            cached: false,
            attempts: outcome.attempts,
            latency_ms: elapsed_ms(started)
        })
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &QuantizedCache {
        &self.cache
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        self.client.backend()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
