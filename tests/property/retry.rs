//! Property tests for the retry executor.
//!
//! Invariants tested:
//! - an always-retryable operation runs exactly max_retries + 1 times
//!   and the total sleep equals the jitter-free ramp
//! - jitter strategies stay within their documented ranges

use picomcp_core::{Clock, ManualClock, ThreadRng, TickDelay};
use picomcp_retry::{Jitter, Outcome, RetryExecutor, RetryPolicy, RetryableError};
use proptest::prelude::*;
use std::sync::Arc;

fn ramp(base: u32, multiplier: f64, max: u32, retries: u32) -> u64 {
    let mut total = 0u64;
    let mut d = f64::from(base);
    for _ in 0..retries {
        let step = d.min(f64::from(max)) as u32;
        total += u64::from(step);
        d *= multiplier;
    }
    total
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn exhaustion_runs_exactly_max_retries_plus_one(
        max_retries in 0u32..=6,
        base in 1u32..=500,
        multiplier in 1.0f64..=3.0,
    ) {
        let max_delay = 10_000u32;
        let clock = ManualClock::shared();
        let mut executor = RetryExecutor::builder()
            .clock(clock.clone())
            .delay(TickDelay::shared(Arc::clone(&clock)))
            .build();
        let policy = RetryPolicy::builder()
            .max_retries(max_retries)
            .base_delay_ms(base)
            .multiplier(multiplier)
            .max_delay_ms(max_delay)
            .jitter(Jitter::None)
            .build();

        let mut calls = 0u32;
        let result: Result<(), _> = executor.execute(&policy, |_| {
            calls += 1;
            Outcome::Retryable(RetryableError::msg("always"))
        });

        prop_assert!(result.is_err());
        prop_assert_eq!(calls, max_retries + 1);
        prop_assert_eq!(
            u64::from(clock.now_ms()),
            ramp(base, multiplier, max_delay, max_retries)
        );
    }

    #[test]
    fn jitter_never_exceeds_the_ramp(
        attempt in 0u32..=8,
        base in 1u32..=500,
        jitter_kind in 0u8..=2,
    ) {
        let jitter = match jitter_kind {
            0 => Jitter::None,
            1 => Jitter::Full,
            _ => Jitter::Equal,
        };
        let policy = RetryPolicy::builder()
            .base_delay_ms(base)
            .multiplier(2.0)
            .max_delay_ms(5_000)
            .jitter(jitter)
            .build();
        let rng = ThreadRng;

        let plain = RetryPolicy::builder()
            .base_delay_ms(base)
            .multiplier(2.0)
            .max_delay_ms(5_000)
            .jitter(Jitter::None)
            .build()
            .delay_for_attempt(attempt, 0, &rng);

        for _ in 0..32 {
            let d = policy.delay_for_attempt(attempt, 0, &rng);
            prop_assert!(d <= plain, "jitter {} exceeded ramp {}", d, plain);
            if matches!(jitter, Jitter::Equal) {
                prop_assert!(d >= plain / 2, "equal jitter {} below half ramp {}", d, plain);
            }
        }
    }

    #[test]
    fn decorrelated_stays_in_documented_bounds(
        base in 1u32..=200,
        max in 500u32..=2_000,
        last in 0u32..=2_000,
    ) {
        let policy = RetryPolicy::builder()
            .base_delay_ms(base)
            .max_delay_ms(max)
            .jitter(Jitter::Decorrelated)
            .build();
        let rng = ThreadRng;

        let prev = last.max(base);
        let upper = prev.saturating_mul(3).min(max.max(base));
        let lower = base.min(upper);
        for _ in 0..32 {
            let d = policy.delay_for_attempt(3, last, &rng);
            prop_assert!(d >= lower && d <= upper, "{} outside [{}, {}]", d, lower, upper);
        }
    }
}
