use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::domain::{PropertyType, ValuationRequest, ValuationResult};
use super::normalizer::normalize_address;
use super::service::ValuationError;

/// Identity of a cacheable valuation: normalized address plus the request
/// knobs that change the outcome. Radius is stored in hundredths of a mile
/// so the key stays hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    address: String,
    radius_hundredths: u64,
    property_type: Option<PropertyType>,
    max_comparables: usize,
}

enum Entry {
    /// A computation for this key is running; waiters block until it lands.
    InFlight,
    Ready {
        result: Arc<ValuationResult>,
        stored_at: Instant,
    },
}

/// Bounded-TTL read-through cache for valuation results with a
/// single-flight guarantee: at most one concurrent recomputation per key.
/// Errors are never cached; a failed leader clears the in-flight marker so
/// a waiter can take over.
pub struct ValuationCache {
    ttl: Duration,
    state: Mutex<HashMap<CacheKey, Entry>>,
    landed: Condvar,
}

impl ValuationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(HashMap::new()),
            landed: Condvar::new(),
        }
    }

    pub fn key_for(request: &ValuationRequest) -> CacheKey {
        CacheKey {
            address: normalize_address(&request.address),
            radius_hundredths: (request.search_radius_miles * 100.0).round() as u64,
            property_type: request.property_type,
            max_comparables: request.max_comparables,
        }
    }

    /// Return the fresh cached result for `key`, or run `compute` exactly
    /// once across all concurrent callers and share its outcome.
    pub fn get_or_compute<F>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<Arc<ValuationResult>, ValuationError>
    where
        F: FnOnce() -> Result<ValuationResult, ValuationError>,
    {
        let mut state = self.lock();
        loop {
            match state.get(&key) {
                Some(Entry::Ready { result, stored_at }) if stored_at.elapsed() < self.ttl => {
                    debug!(address = %key.address, "valuation cache hit");
                    return Ok(Arc::clone(result));
                }
                Some(Entry::InFlight) => {
                    state = self
                        .landed
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                _ => break,
            }
        }

        // This caller is the leader for the key.
        state.insert(key.clone(), Entry::InFlight);
        drop(state);

        let outcome = compute();

        let mut state = self.lock();
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                state.insert(
                    key,
                    Entry::Ready {
                        result: Arc::clone(&result),
                        stored_at: Instant::now(),
                    },
                );
                self.landed.notify_all();
                Ok(result)
            }
            Err(err) => {
                state.remove(&key);
                self.landed.notify_all();
                Err(err)
            }
        }
    }

    /// Drop expired entries; callers may run this periodically to bound
    /// memory between bursts of distinct keys.
    pub fn evict_expired(&self) {
        let mut state = self.lock();
        state.retain(|_, entry| match entry {
            Entry::InFlight => true,
            Entry::Ready { stored_at, .. } => stored_at.elapsed() < self.ttl,
        });
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
