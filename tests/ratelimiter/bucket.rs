use picomcp_core::ManualClock;
use picomcp_ratelimiter::{RateLimiter, RateLimiterConfig};
use std::sync::Arc;

fn limiter(capacity: f64, rate: f64) -> (RateLimiter, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let limiter = RateLimiterConfig::builder()
        .capacity(capacity)
        .refill_per_sec(rate)
        .clock(clock.clone())
        .name("integration")
        .build();
    (limiter, clock)
}

/// Sustained-rate scenario: rate 10/s, capacity 5. A burst of five is
/// allowed, the sixth denied with a ~100 ms hint; after a second, ten
/// calls spaced 100 ms apart all pass.
#[test]
fn sustained_rate_after_burst() {
    let (mut limiter, clock) = limiter(5.0, 10.0);

    for _ in 0..5 {
        assert!(limiter.try_acquire_one().is_allowed());
    }
    let denied = limiter.try_acquire_one();
    assert!(!denied.is_allowed());
    assert!(
        (100..=101).contains(&denied.retry_after_ms()),
        "retry_after_ms = {}",
        denied.retry_after_ms()
    );

    clock.set(1_000);
    for _ in 0..10 {
        assert!(limiter.try_acquire_one().is_allowed());
        clock.advance(100);
    }

    let stats = limiter.stats();
    assert_eq!(stats.total_allowed, 15);
    assert_eq!(stats.total_denied, 1);
}

/// A full idle period of capacity/rate seconds refills the bucket
/// completely.
#[test]
fn idle_refills_to_full() {
    let (mut limiter, clock) = limiter(5.0, 10.0);
    for _ in 0..5 {
        limiter.try_acquire_one();
    }
    clock.advance(500); // 5 tokens / 10 per sec
    assert_eq!(limiter.tokens(), 5.0);
    for _ in 0..5 {
        assert!(limiter.try_acquire_one().is_allowed());
    }
}

/// Fractional costs draw down the bucket proportionally.
#[test]
fn fractional_costs() {
    let (mut limiter, _clock) = limiter(1.0, 0.0);
    assert!(limiter.try_acquire(0.25).is_allowed());
    assert!(limiter.try_acquire(0.25).is_allowed());
    assert!(limiter.try_acquire(0.5).is_allowed());
    assert!(!limiter.try_acquire(0.1).is_allowed());
}

/// The denial hint is proportional to the missing tokens.
#[test]
fn retry_hint_scales_with_cost() {
    let (mut limiter, _clock) = limiter(2.0, 2.0);
    limiter.try_acquire(2.0);
    let denied = limiter.try_acquire(2.0);
    // 2 tokens at 2/s is a full second away.
    assert!((1_000..=1_001).contains(&denied.retry_after_ms()));
}
