//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - exactly `threshold` consecutive failures trip the circuit
//! - an open circuit admits nothing before the recovery timeout and a
//!   probe immediately at it
//! - `half_open_success_threshold` successive probe successes close it

use picomcp_circuitbreaker::{CircuitBreakerConfig, CircuitState};
use picomcp_core::{Clock, ManualClock};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn consecutive_failures_always_trip(
        threshold in 1u32..=10,
        prefix in prop::collection::vec(prop::bool::ANY, 0..30),
    ) {
        let clock = ManualClock::shared();
        let mut cb = CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .recovery_timeout_ms(1_000)
            .clock(clock)
            .build();

        // Random warm-up that never reaches the threshold in a row.
        let mut run = 0;
        for fail in prefix {
            if fail && run + 1 < threshold {
                cb.record_failure();
                run += 1;
            } else {
                cb.record_success();
                run = 0;
            }
        }
        prop_assert_eq!(cb.state(), CircuitState::Closed);

        // Now exactly `threshold` consecutive failures.
        for i in 0..threshold {
            prop_assert_eq!(cb.state(), CircuitState::Closed, "tripped early at {}", i);
            cb.record_failure();
        }
        prop_assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn recovery_boundary_is_exact(
        threshold in 1u32..=5,
        recovery in 1u32..=10_000,
    ) {
        let clock = ManualClock::shared();
        let mut cb = CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .recovery_timeout_ms(recovery)
            .clock(clock.clone())
            .build();

        for _ in 0..threshold {
            cb.record_failure();
        }
        let tripped_at = clock.now_ms();

        clock.set(tripped_at + recovery - 1);
        prop_assert!(!cb.allow_request());
        prop_assert_eq!(cb.state(), CircuitState::Open);

        clock.set(tripped_at + recovery);
        prop_assert!(cb.allow_request());
        prop_assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_closes_after_k_successes(
        threshold in 1u32..=5,
        k in 1u32..=5,
    ) {
        let clock = ManualClock::shared();
        let mut cb = CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .recovery_timeout_ms(100)
            .half_open_success_threshold(k)
            .clock(clock.clone())
            .build();

        for _ in 0..threshold {
            cb.record_failure();
        }
        clock.advance(100);
        prop_assert!(cb.allow_request());

        for i in 0..k {
            prop_assert_eq!(cb.state(), CircuitState::HalfOpen, "closed early at {}", i);
            cb.record_success();
        }
        prop_assert_eq!(cb.state(), CircuitState::Closed);
        prop_assert_eq!(cb.stats().trip_count, 1);
    }
}
