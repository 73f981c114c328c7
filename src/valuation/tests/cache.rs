use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::valuation::cache::ValuationCache;
use crate::valuation::service::{Stage, ValuationError};

#[test]
fn key_normalizes_address_spelling() {
    let mut shouting = request();
    shouting.address = "  500 PALM   Drive, Beverly Hills,\u{feff} CA 90210 ".to_string();
    assert_eq!(
        ValuationCache::key_for(&request()),
        ValuationCache::key_for(&shouting)
    );

    let mut wider = request();
    wider.search_radius_miles = 12.0;
    assert_ne!(
        ValuationCache::key_for(&request()),
        ValuationCache::key_for(&wider)
    );
}

#[test]
fn second_lookup_within_ttl_hits_the_cache() {
    let cache = Arc::new(ValuationCache::new(Duration::from_secs(300)));
    let pool = Arc::new(CountingPool::new(default_pool_records()));
    let service = service(Arc::new(CountingGeocoder::resolving()), pool.clone())
        .with_cache(cache);

    let first = service.evaluate_at(&request(), now(), None).expect("first");
    let second = service.evaluate_at(&request(), now(), None).expect("second");
    assert_eq!(first, second);
    assert_eq!(pool.fetch_count(), 1);
}

#[test]
fn expired_entries_are_recomputed() {
    let cache = Arc::new(ValuationCache::new(Duration::ZERO));
    let pool = Arc::new(CountingPool::new(default_pool_records()));
    let service = service(Arc::new(CountingGeocoder::resolving()), pool.clone())
        .with_cache(cache);

    service.evaluate_at(&request(), now(), None).expect("first");
    service.evaluate_at(&request(), now(), None).expect("second");
    assert_eq!(pool.fetch_count(), 2);
}

#[test]
fn concurrent_requests_share_one_computation() {
    let cache = Arc::new(ValuationCache::new(Duration::from_secs(300)));
    let pool = Arc::new(
        CountingPool::new(default_pool_records()).with_delay(Duration::from_millis(50)),
    );
    let service = Arc::new(
        service(Arc::new(CountingGeocoder::resolving()), pool.clone()).with_cache(cache),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(std::thread::spawn(move || {
            service.evaluate_at(&request(), now(), None)
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread join").expect("valuation"))
        .collect();

    assert_eq!(pool.fetch_count(), 1, "single-flight must dedupe recomputation");
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[test]
fn failed_computation_is_not_cached() {
    let cache = ValuationCache::new(Duration::from_secs(300));
    let key = ValuationCache::key_for(&request());
    let attempts = AtomicUsize::new(0);

    let err = cache
        .get_or_compute(key.clone(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ValuationError::InsufficientData {
                stage: Stage::Screening,
                reason: "empty pool".to_string(),
            })
        })
        .expect_err("first attempt fails");
    assert!(matches!(err, ValuationError::InsufficientData { .. }));

    // The failure left no entry behind, so the next caller computes again.
    let service = service(
        Arc::new(CountingGeocoder::resolving()),
        Arc::new(CountingPool::new(default_pool_records())),
    );
    let result = cache
        .get_or_compute(key.clone(), || service.evaluate_at(&request(), now(), None))
        .expect("second attempt succeeds");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    // And the success is now served from cache.
    let cached = cache
        .get_or_compute(key, || {
            panic!("must not recompute a fresh entry");
        })
        .expect("cache hit");
    assert_eq!(*cached, *result);
}
