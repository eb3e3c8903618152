//! Shared test doubles and fixtures for the gateway workspace.
//!
//! - [`ScriptedBackend`] replays a queue of replies, failures and hangs and
//!   counts every call it receives.
//! - [`PendingBackend`] never answers, for exercising timeouts.
//! - Fixture builders for the canonical market scenarios and for
//!   configurations with short, deterministic delays.

mod doubles;
mod fixtures;

pub use doubles::*;
pub use fixtures::*;
use std::sync::atomic::{AtomicU32, Ordering};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn unique_client_id() -> gw_core::ClientId {
    gw_core::ClientId::new(unique_id("test-client"))
}
