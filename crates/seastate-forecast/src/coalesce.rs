//! Single-flight coalescing of forecast refreshes.
//!
//! When several callers miss the cache for the same coordinate at once, only
//! the first (the leader) runs the pipeline; the others subscribe to a
//! broadcast channel and receive the leader's result.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::types::{Coordinate, CoordinateKey, Forecast};

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerStats {
    pub total_requests: u64,
    /// Requests that waited on an existing refresh
    pub coalesced_requests: u64,
    /// Requests that started a refresh
    pub new_requests: u64,
}

impl CoalescerStats {
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestCoalescer {
    in_flight: Mutex<HashMap<CoordinateKey, broadcast::Sender<Arc<Forecast>>>>,
    stats: Mutex<CoalescerStats>,
}

/// Outcome of [`RequestCoalescer::register`].
#[derive(Debug)]
pub enum Registration {
    /// Caller must refresh and then call [`InFlight::complete`].
    Leader(InFlight),
    /// Another refresh is running; wait for its result.
    Coalesced(broadcast::Receiver<Arc<Forecast>>),
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(self: &Arc<Self>, coordinate: &Coordinate) -> Registration {
        let key = coordinate.cache_key();
        let mut in_flight = self.in_flight.lock();
        let mut stats = self.stats.lock();
        stats.total_requests += 1;

        if let Some(tx) = in_flight.get(&key) {
            stats.coalesced_requests += 1;
            tracing::debug!(
                lat = coordinate.latitude,
                lon = coordinate.longitude,
                "Coalescing request onto in-flight refresh"
            );
            return Registration::Coalesced(tx.subscribe());
        }

        // one message is ever sent per channel
        let (tx, _rx) = broadcast::channel(1);
        in_flight.insert(key, tx);
        stats.new_requests += 1;

        Registration::Leader(InFlight {
            coalescer: Arc::clone(self),
            key,
            completed: false,
        })
    }

    pub fn stats(&self) -> CoalescerStats {
        *self.stats.lock()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    fn finish(&self, key: &CoordinateKey, forecast: Option<Arc<Forecast>>) {
        let Some(tx) = self.in_flight.lock().remove(key) else {
            return;
        };

        if let Some(forecast) = forecast {
            let waiters = tx.receiver_count();
            // no receivers is fine
            let _ = tx.send(forecast);
            if waiters > 0 {
                tracing::debug!(waiters, "Broadcast forecast to coalesced waiters");
            }
        }
    }
}

/// Leader's handle on an in-flight refresh.
///
/// Dropping it without completing releases the key; waiters then see a
/// closed channel.
#[derive(Debug)]
pub struct InFlight {
    coalescer: Arc<RequestCoalescer>,
    key: CoordinateKey,
    completed: bool,
}

impl InFlight {
    pub fn complete(mut self, forecast: Arc<Forecast>) {
        self.completed = true;
        self.coalescer.finish(&self.key, Some(forecast));
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.completed {
            self.coalescer.finish(&self.key, None);
        }
    }
}
