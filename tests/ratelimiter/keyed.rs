use picomcp_core::ManualClock;
use picomcp_ratelimiter::{KeyedRateLimiter, RateLimiterConfig};
use std::sync::{Arc, Mutex};

fn pool(capacity: f64, rate: f64, max_keys: usize) -> (KeyedRateLimiter, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let pool = RateLimiterConfig::builder()
        .capacity(capacity)
        .refill_per_sec(rate)
        .max_keys(max_keys)
        .clock(clock.clone())
        .name("keyed-integration")
        .build_keyed();
    (pool, clock)
}

/// Each key gets its own bucket; exhausting one leaves the others
/// untouched.
#[test]
fn keys_are_isolated() {
    let (mut pool, _clock) = pool(2.0, 0.0, 8);
    assert!(pool.try_acquire_one("alpha").is_allowed());
    assert!(pool.try_acquire_one("alpha").is_allowed());
    assert!(!pool.try_acquire_one("alpha").is_allowed());

    for key in ["bravo", "charlie", "delta"] {
        assert!(pool.try_acquire_one(key).is_allowed());
    }
    let stats = pool.stats();
    assert_eq!(stats.active_keys, 4);
    assert_eq!(stats.total_denied, 1);
}

/// When the pool is full, the bucket with the oldest access goes first,
/// and the eviction counter tracks every displacement.
#[test]
fn lru_eviction_under_key_churn() {
    let (mut pool, clock) = pool(5.0, 1.0, 2);
    let evicted = Arc::new(Mutex::new(Vec::new()));
    {
        // Rebuild with a listener to observe eviction order.
        let evicted = Arc::clone(&evicted);
        let clock2 = ManualClock::shared();
        let mut observed = RateLimiterConfig::builder()
            .capacity(5.0)
            .max_keys(2)
            .clock(clock2.clone())
            .on_evicted(move |key| evicted.lock().unwrap().push(key.to_string()))
            .build_keyed();
        observed.try_acquire_one("first");
        clock2.advance(10);
        observed.try_acquire_one("second");
        clock2.advance(10);
        observed.try_acquire_one("third");
        clock2.advance(10);
        observed.try_acquire_one("fourth");
        assert_eq!(observed.evictions(), 2);
    }
    assert_eq!(evicted.lock().unwrap().as_slice(), ["first", "second"]);

    // The original pool still works independently.
    pool.try_acquire_one("a");
    clock.advance(5);
    pool.try_acquire_one("b");
    clock.advance(5);
    pool.try_acquire_one("c");
    assert_eq!(pool.evictions(), 1);
    assert_eq!(pool.active_keys(), 2);
}

/// Reconfiguring refreshes every bucket to the new capacity without
/// forgetting the keys.
#[test]
fn reconfiguration_keeps_entries() {
    let (mut pool, _clock) = pool(1.0, 0.0, 4);
    pool.try_acquire_one("a");
    pool.try_acquire_one("b");
    assert!(!pool.try_acquire_one("a").is_allowed());

    pool.set_rate(3.0, 1.0);
    assert_eq!(pool.active_keys(), 2);
    for _ in 0..3 {
        assert!(pool.try_acquire_one("a").is_allowed());
    }
    assert!(!pool.try_acquire_one("a").is_allowed());
}
