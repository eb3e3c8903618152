//! # Gateway Errors
//!
//! Error taxonomy for the commentary gateway.
//!
//! - [`GatewayError`] is what a caller of the request pipeline sees. Every
//!   variant carries a machine-checkable [`GatewayError::kind`] and a
//!   human-readable message that never includes upstream response bodies or
//!   credentials.
//! - [`UpstreamFailure`] classifies a single failed attempt against the
//!   inference service and decides whether it may be retried.
//! - [`CacheError`] covers the rare internal cache faults that degrade to a
//!   cache miss instead of failing the request.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single violated constraint on one request field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: ViolationCode,
    pub message: String
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into()
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Missing,
    NotANumber,
    NotFinite,
    OutOfRange
}

/// Which admission window rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    Minute,
    Hour
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Minute => "minute",
            RateLimitScope::Hour => "hour"
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal classification of an upstream failure surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    /// Every attempt failed with a retryable upstream error.
    RetriesExhausted,
    /// The upstream refused the request as malformed; never retried.
    Rejected
}

/// Outcome of one failed attempt against the inference service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamFailure {
    #[error("upstream call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("upstream throttled the request")]
    Throttled { retry_after: Option<u64> },

    #[error("upstream server error (status {status})")]
    Server { status: u16 },

    // `detail` is kept for logs only and is not part of the display text.
    #[error("upstream rejected the request (status {status})")]
    Rejected { status: u16, detail: String },

    #[error("upstream transport failure: {reason}")]
    Transport { reason: String },

    #[error("upstream returned an empty payload")]
    EmptyPayload
}

impl UpstreamFailure {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, UpstreamFailure::Rejected { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamFailure::Timeout { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamFailure::Throttled { .. } => Some(429),
            UpstreamFailure::Server { status } | UpstreamFailure::Rejected { status, .. } => {
                Some(*status)
            }
            _ => None
        }
    }

    /// Server-requested delay before the next attempt, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            UpstreamFailure::Throttled { retry_after } => *retry_after,
            _ => None
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamFailure::Timeout { .. } => "timeout",
            UpstreamFailure::Throttled { .. } => "throttled",
            UpstreamFailure::Server { .. } => "server_error",
            UpstreamFailure::Rejected { .. } => "rejected",
            UpstreamFailure::Transport { .. } => "transport",
            UpstreamFailure::EmptyPayload => "empty_payload"
        }
    }

    /// Caller-safe summary of the failure.
    pub fn summary(&self) -> String {
        match self {
            UpstreamFailure::Timeout { .. } => {
                "the inference service did not respond in time".to_string()
            }
            UpstreamFailure::Throttled { .. } => {
                "the inference service is throttling requests".to_string()
            }
            UpstreamFailure::Server { status } => {
                format!("the inference service failed with status {status}")
            }
            UpstreamFailure::Rejected { status, .. } => {
                format!("the inference service rejected the request with status {status}")
            }
            UpstreamFailure::Transport { .. } => {
                "the inference service could not be reached".to_string()
            }
            UpstreamFailure::EmptyPayload => {
                "the inference service returned no commentary".to_string()
            }
        }
    }
}

/// Internal cache faults. These never fail a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("Cache key overflow: {field} bucket does not fit the key space")]
    KeyOverflow { field: String },

    #[error("Cache key rejected non-finite {field}")]
    NonFinite { field: String }
}

/// Errors returned by the request pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid request: {count} field constraint(s) violated", count = .violations.len())]
    Validation { violations: Vec<FieldViolation> },

    #[error("Rate limit exceeded for the {scope} window: retry after {retry_after}s")]
    RateLimited {
        retry_after: u64,
        scope: RateLimitScope
    },

    #[error("Upstream timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32, timeout_ms: u64 },

    #[error("Upstream error after {attempts} attempt(s): {message}")]
    Upstream {
        kind: UpstreamErrorKind,
        status: Option<u16>,
        attempts: u32,
        message: String
    },

    #[error("Cache fault: {0}")]
    Cache(#[from] CacheError),

    #[error("Internal error: {message}")]
    Internal { message: String }
}

impl GatewayError {
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        GatewayError::Validation { violations }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal {
            message: message.into()
        }
    }

    /// Stable, machine-checkable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation { .. } => "validation_error",
            GatewayError::RateLimited { .. } => "rate_limit_error",
            GatewayError::Timeout { .. } => "timeout_error",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::Cache(_) => "cache_error",
            GatewayError::Internal { .. } => "internal_error"
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Validation { .. } => "VALIDATION_FAILED",
            GatewayError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            GatewayError::Timeout { .. } => "UPSTREAM_TIMEOUT",
            GatewayError::Upstream {
                kind: UpstreamErrorKind::RetriesExhausted,
                ..
            } => "UPSTREAM_RETRIES_EXHAUSTED",
            GatewayError::Upstream {
                kind: UpstreamErrorKind::Rejected,
                ..
            } => "UPSTREAM_REJECTED",
            GatewayError::Cache(_) => "CACHE_FAULT",
            GatewayError::Internal { .. } => "INTERNAL_ERROR"
        }
    }

    /// Seconds the caller should wait before retrying, when known.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            GatewayError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None
        }
    }

    /// Number of upstream attempts made before the error surfaced.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            GatewayError::Timeout { attempts, .. } | GatewayError::Upstream { attempts, .. } => {
                Some(*attempts)
            }
            _ => None
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
