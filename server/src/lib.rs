//! # Commentary Gateway Server
//!
//! HTTP front end for the request-governance pipeline.
//!
//! ## Endpoints
//!
//! - `POST /api/analysis` - Validated, rate-limited, cached commentary
//! - `GET /api/health` - Component health (206 when degraded)
//! - `GET /api/health/live` / `GET /api/health/ready` - Probes
//! - `GET /api/stats` - Rolling request and cache statistics
//! - `DELETE /api/cache` - Drop every cached commentary
//! - `GET /metrics` - Prometheus metrics

pub mod error;
pub mod handlers;
pub mod janitor;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use error::{ApiError, ApiResult};
pub use janitor::JanitorJob;
pub use routes::create_router;
pub use server::{GatewayServer, ServerError};
pub use state::AppState;
