//! Result cache keyed by bucketed market parameters.

use config::CacheConfig;
use errors::CacheError;
use gw_core::{Commentary, MarketField, MarketParams};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Bucket widths for each market field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Granularity {
    pub rate: f64,
    pub fx: f64,
    pub asset: f64,
    pub bond: f64
}

impl Granularity {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            rate: config.rate_step,
            fx: config.fx_step,
            asset: config.asset_step,
            bond: config.bond_step
        }
    }

    pub fn step(&self, field: MarketField) -> f64 {
        match field {
            MarketField::Rate => self.rate,
            MarketField::Fx => self.fx,
            MarketField::AssetA | MarketField::AssetB => self.asset,
            MarketField::BondIndex => self.bond
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Bucket indices of the five fields, in canonical field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([i64; 5]);

impl CacheKey {
    pub fn buckets(&self) -> &[i64; 5] {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Commentary,
    inserted_at: Instant
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub capacity: usize
}

impl CacheStats {
    /// Fraction of lookups served from cache, in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// TTL + LRU cache of generated commentary.
///
/// Expired entries are removed lazily when looked up; nothing sweeps the map
/// in the background. Capacity is enforced on insert by evicting the least
/// recently used entry.
pub struct QuantizedCache {
    enabled: bool,
    ttl: Duration,
    granularity: Granularity,
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64
}

impl QuantizedCache {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: config.enabled,
            ttl: config.ttl(),
            granularity: Granularity::from_config(config),
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0)
        }
    }

    /// Derives the canonical key by rounding each field to its bucket.
    pub fn key(&self, params: &MarketParams) -> Result<CacheKey, CacheError> {
        let mut buckets = [0i64; 5];
        for (slot, field) in buckets.iter_mut().zip(MarketField::ALL) {
            *slot = bucket(params.get(field), self.granularity.step(field), field)?;
        }
        Ok(CacheKey(buckets))
    }

    pub fn get(&self, key: &CacheKey) -> Option<Commentary> {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        entries.pop(key);
        self.expirations.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(?key, "Cache entry expired");
        None
    }

    /// Counts a lookup that never reached the map, such as a request whose
    /// key could not be derived.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Stores `value`, replacing any entry for `key` with a fresh timestamp.
    pub fn set(&self, key: CacheKey, value: Commentary) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            value,
            inserted_at: Instant::now()
        };
        let displaced = self.entries.lock().push(key, entry);
        if let Some((evicted_key, _)) =
            displaced.filter(|(displaced_key, _)| *displaced_key != key)
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = ?evicted_key, "Cache entry evicted");
        }
    }

    /// Removes every entry and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let cleared = entries.len();
        entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn granularity(&self) -> &Granularity {
        &self.granularity
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: entries.cap().get()
        }
    }
}

fn bucket(value: f64, step: f64, field: MarketField) -> Result<i64, CacheError> {
    if !value.is_finite() || !step.is_finite() || step <= 0.0 {
        return Err(CacheError::NonFinite {
            field: field.json_name().to_string()
        });
    }

    let index = (value / step).round();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if !index.is_finite() || index < i64::MIN as f64 || index >= i64::MAX as f64 {
        return Err(CacheError::KeyOverflow {
            field: field.json_name().to_string()
        });
    }

    Ok(index as i64)
}
