//! Property tests for the token-bucket rate limiter.
//!
//! Invariants tested:
//! - allowed + denied equals the number of unit-cost attempts
//! - the token balance never exceeds capacity
//! - a full-capacity burst at zero elapsed time yields exactly one
//!   denial on the (capacity+1)th call

use picomcp_core::ManualClock;
use picomcp_ratelimiter::RateLimiterConfig;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counters_partition_attempts(
        capacity in 1u32..=20,
        rate in 0u32..=50,
        steps in prop::collection::vec((0u32..500, prop::bool::ANY), 1..100),
    ) {
        let clock = ManualClock::shared();
        let mut limiter = RateLimiterConfig::builder()
            .capacity(f64::from(capacity))
            .refill_per_sec(f64::from(rate))
            .clock(clock.clone())
            .build();

        let mut attempts = 0u64;
        for (advance, acquire) in steps {
            clock.advance(advance);
            if acquire {
                limiter.try_acquire_one();
                attempts += 1;
            }
            prop_assert!(limiter.tokens() <= f64::from(capacity));
        }
        let stats = limiter.stats();
        prop_assert_eq!(stats.total_allowed + stats.total_denied, attempts);
    }

    #[test]
    fn burst_overflows_by_exactly_one(capacity in 1u32..=50) {
        let clock = ManualClock::shared();
        let mut limiter = RateLimiterConfig::builder()
            .capacity(f64::from(capacity))
            .refill_per_sec(1.0)
            .clock(clock)
            .build();

        let mut denied = 0;
        for _ in 0..=capacity {
            if !limiter.try_acquire_one().is_allowed() {
                denied += 1;
            }
        }
        prop_assert_eq!(denied, 1);
    }

    #[test]
    fn idle_refill_fills_the_bucket(
        capacity in 1u32..=20,
        rate in 1u32..=50,
    ) {
        let clock = ManualClock::shared();
        let mut limiter = RateLimiterConfig::builder()
            .capacity(f64::from(capacity))
            .refill_per_sec(f64::from(rate))
            .clock(clock.clone())
            .build();

        for _ in 0..capacity {
            limiter.try_acquire_one();
        }
        // capacity / rate seconds, rounded up to whole milliseconds.
        let idle_ms = (u64::from(capacity) * 1_000).div_ceil(u64::from(rate)) as u32;
        clock.advance(idle_ms);
        prop_assert_eq!(limiter.tokens(), f64::from(capacity));
    }
}
