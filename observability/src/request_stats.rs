use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const MAX_RECORDS: usize = 50_000;
const TOP_ENDPOINTS: usize = 5;

/// One completed HTTP request.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub at: Instant,
    pub endpoint: String,
    pub status: u16,
    pub latency: Duration
}

impl RequestRecord {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointCount {
    pub endpoint: String,
    pub count: u64
}

/// Point-in-time view over the rolling window plus lifetime counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub requests_in_window: u64,
    pub error_rate_percent: f64,
    pub avg_latency_ms: f64,
    pub rate_limited_total: u64,
    pub top_endpoints: Vec<EndpointCount>
}

/// Rolling request statistics.
///
/// Records older than the window are dropped on every write and on every
/// snapshot. The buffer is additionally capped so a burst cannot grow it
/// without bound.
pub struct RequestStats {
    window: Duration,
    records: Mutex<VecDeque<RequestRecord>>,
    total: AtomicU64,
    rate_limited: AtomicU64
}

impl RequestStats {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            records: Mutex::new(VecDeque::new()),
            total: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0)
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn record(&self, endpoint: impl Into<String>, status: u16, latency: Duration) {
        self.record_at(endpoint, status, latency, Instant::now());
    }

    pub fn record_at(
        &self,
        endpoint: impl Into<String>,
        status: u16,
        latency: Duration,
        at: Instant
    ) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if status == 429 {
            self.rate_limited.fetch_add(1, Ordering::Relaxed);
        }

        let mut records = self.records.lock();
        self.prune(&mut records, at);
        if records.len() >= MAX_RECORDS {
            records.pop_front();
        }
        records.push_back(RequestRecord {
            at,
            endpoint: endpoint.into(),
            status,
            latency
        });
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> StatsSnapshot {
        let mut records = self.records.lock();
        self.prune(&mut records, now);

        let count = records.len() as u64;
        let errors = records.iter().filter(|r| r.is_error()).count() as u64;
        let latency_ms: f64 = records
            .iter()
            .map(|r| r.latency.as_secs_f64() * 1000.0)
            .sum();

        let mut by_endpoint: HashMap<&str, u64> = HashMap::new();
        for record in records.iter() {
            *by_endpoint.entry(record.endpoint.as_str()).or_insert(0) += 1;
        }
        let mut top_endpoints: Vec<EndpointCount> = by_endpoint
            .into_iter()
            .map(|(endpoint, count)| EndpointCount {
                endpoint: endpoint.to_string(),
                count
            })
            .collect();
        top_endpoints.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.endpoint.cmp(&b.endpoint))
        });
        top_endpoints.truncate(TOP_ENDPOINTS);

        StatsSnapshot {
            requests_total: self.total.load(Ordering::Relaxed),
            requests_in_window: count,
            error_rate_percent: percent(errors, count),
            avg_latency_ms: if count == 0 {
                0.0
            } else {
                round2(latency_ms / count as f64)
            },
            rate_limited_total: self.rate_limited.load(Ordering::Relaxed),
            top_endpoints
        }
    }

    fn prune(&self, records: &mut VecDeque<RequestRecord>, now: Instant) {
        while records
            .front()
            .is_some_and(|r| now.saturating_duration_since(r.at) > self.window)
        {
            records.pop_front();
        }
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 * 100.0 / whole as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
