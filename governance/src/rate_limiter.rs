//! Per-client admission control over two sliding windows.
//!
//! Each client owns an ordered deque of admission timestamps. A check prunes
//! everything older than the long window from the front, counts the tail
//! that still falls inside the short window, and either appends `now` or
//! reports how long the caller must wait. The whole decision runs while the
//! client's map entry is locked, so two concurrent checks can never both take
//! the last slot.

use config::RateLimitConfig;
use dashmap::DashMap;
use errors::RateLimitScope;
use gw_core::ClientId;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Admitted; `remaining` short-window slots are left.
    Allowed { remaining: u32 },
    Denied {
        retry_after: u64,
        scope: RateLimitScope
    }
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

pub struct RateLimiter {
    short_window: Duration,
    short_limit: usize,
    long_window: Duration,
    long_limit: usize,
    windows: DashMap<String, VecDeque<Instant>>
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            short_window: config.short_window(),
            short_limit: config.short_limit.max(1) as usize,
            long_window: config.long_window(),
            long_limit: config.long_limit.max(1) as usize,
            windows: DashMap::new()
        }
    }

    pub fn check(&self, client: &ClientId) -> Decision {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &ClientId, now: Instant) -> Decision {
        let mut entry = self.windows.entry(client.as_str().to_string()).or_default();
        let window = entry.value_mut();

        prune(window, now, self.long_window);

        let short_count = count_within(window, now, self.short_window);
        if short_count >= self.short_limit {
            let oldest = window[window.len() - self.short_limit];
            return Decision::Denied {
                retry_after: seconds_until_expiry(oldest, now, self.short_window),
                scope: RateLimitScope::Minute
            };
        }

        if window.len() >= self.long_limit {
            let oldest = window[window.len() - self.long_limit];
            return Decision::Denied {
                retry_after: seconds_until_expiry(oldest, now, self.long_window),
                scope: RateLimitScope::Hour
            };
        }

        window.push_back(now);
        Decision::Allowed {
            remaining: (self.short_limit - short_count - 1) as u32
        }
    }

    /// Short-window slots the client could still use right now.
    pub fn remaining(&self, client: &ClientId) -> u32 {
        let now = Instant::now();
        let used = self
            .windows
            .get(client.as_str())
            .map_or(0, |window| count_within(&window, now, self.short_window));
        self.short_limit.saturating_sub(used) as u32
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drops clients whose every timestamp has aged out of the long window.
    ///
    /// Returns the number of clients removed.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.windows.retain(|_, window| {
            prune(window, now, self.long_window);
            if window.is_empty() {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, span: Duration) {
    while let Some(front) = window.front() {
        if now.saturating_duration_since(*front) < span {
            break;
        }
        window.pop_front();
    }
}

fn count_within(window: &VecDeque<Instant>, now: Instant, span: Duration) -> usize {
    let first_inside = window.partition_point(|t| now.saturating_duration_since(*t) >= span);
    window.len() - first_inside
}

fn seconds_until_expiry(timestamp: Instant, now: Instant, span: Duration) -> u64 {
    let wait = (timestamp + span).saturating_duration_since(now);
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}
