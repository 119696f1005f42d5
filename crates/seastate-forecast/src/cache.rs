//! In-memory TTL cache of finished forecasts, keyed by exact coordinate.
//!
//! Entries are replaced wholesale on refresh. When the cache is full the
//! least recently used entry is evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::types::{Coordinate, CoordinateKey, Forecast};

#[derive(Debug)]
struct CacheEntry {
    forecast: Arc<Forecast>,
    fetched_at: DateTime<Utc>,
    last_used: u64,
}

/// Counters for monitoring cache effectiveness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that found an entry older than the TTL
    pub stale: u64,
    pub evictions: u64,
    pub inserts: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CoordinateKey, CacheEntry>,
    tick: u64,
    stats: CacheStats,
}

#[derive(Debug)]
pub struct ForecastCache {
    ttl: chrono::Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl ForecastCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl)
                .unwrap_or_else(|_| chrono::Duration::days(365 * 100)),
            capacity: capacity.max(1),
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Fresh entry for `coordinate`, if any.
    ///
    /// An entry is fresh while its age is below the TTL. Entries stamped in
    /// the future (clock adjustments) count as fresh.
    pub fn get(&self, coordinate: &Coordinate) -> Option<Arc<Forecast>> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;

        let lookup = state.entries.get_mut(&coordinate.cache_key()).map(|entry| {
            if now - entry.fetched_at < self.ttl {
                entry.last_used = tick;
                Some(Arc::clone(&entry.forecast))
            } else {
                None
            }
        });

        match lookup {
            Some(Some(forecast)) => {
                state.stats.hits += 1;
                Some(forecast)
            }
            Some(None) => {
                state.stats.stale += 1;
                state.stats.misses += 1;
                None
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    /// Store `forecast` as fetched now, replacing any previous entry.
    pub fn insert(&self, coordinate: &Coordinate, forecast: Arc<Forecast>) {
        let fetched_at = self.clock.now();
        let key = coordinate.cache_key();
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                state.stats.evictions += 1;
                tracing::debug!(capacity = self.capacity, "Evicted least recently used forecast");
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                forecast,
                fetched_at,
                last_used: tick,
            },
        );
        state.stats.inserts += 1;
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    pub fn log_stats(&self) {
        let state = self.state.lock();
        let stats = state.stats;
        tracing::info!(
            entries = state.entries.len(),
            hits = stats.hits,
            misses = stats.misses,
            stale = stats.stale,
            evictions = stats.evictions,
            hit_ratio = format!("{:.1}%", stats.hit_ratio() * 100.0),
            "Forecast cache statistics"
        );
    }
}
